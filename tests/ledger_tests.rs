mod helpers;

use axum::http::StatusCode;
use futures::future::join_all;
use squidpro_server::entities::amount::Amount;
use squidpro_server::entities::balance::{
    AccountKey, AccountKind, BalanceView, TREASURY_PLATFORM, TREASURY_REVIEWER_POOL,
};
use squidpro_server::entities::supplier::SupplierStatus;
use squidpro_server::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use squidpro_server::interfaces::repositories::supplier_ifce::SupplierRepositoryInterface;
use squidpro_server::middleware::error::AppError;
use squidpro_server::services::ledger_service::LedgerService;
use squidpro_server::services::revenue_service::RevenueShares;
use squidpro_server::utils::jwt::CallerRole;

use crate::helpers::{
    admin_token, create_package, create_reviewer, create_supplier, credit, reviewer_token, token,
};

test_with_server!(concurrent_credits_are_not_lost, |_server, ctx_state, _config, _rail| {
    let reviewer = create_reviewer(&ctx_state, None).await;
    let key = AccountKey::reviewer(reviewer.id.id.to_raw());
    let ledger = LedgerService::new(&ctx_state.db.balances);
    let cent = Amount::from_micros(10_000);

    let results = join_all((0..50).map(|_| ledger.credit(&key, cent))).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let balance = ledger.get(&key).await.unwrap();
    assert_eq!(balance.balance, Amount::from_micros(500_000));
    assert_eq!(balance.balance.to_string(), "0.500000");
});

test_with_server!(non_positive_credit_is_rejected, |_server, ctx_state, _config, _rail| {
    let reviewer = create_reviewer(&ctx_state, None).await;
    let key = AccountKey::reviewer(reviewer.id.id.to_raw());
    let ledger = LedgerService::new(&ctx_state.db.balances);

    let zero = ledger.credit(&key, Amount::ZERO).await;
    assert!(matches!(zero, Err(AppError::Validation { .. })));
    let negative = ledger.credit(&key, Amount::from_micros(-1)).await;
    assert!(matches!(negative, Err(AppError::Validation { .. })));

    assert_eq!(ledger.get(&key).await.unwrap().balance, Amount::ZERO);
});

test_with_server!(settled_amount_keeps_late_credits, |_server, ctx_state, _config, _rail| {
    let reviewer = create_reviewer(&ctx_state, None).await;
    let key = AccountKey::reviewer(reviewer.id.id.to_raw());
    credit(&ctx_state, &key, "6").await;
    credit(&ctx_state, &key, "4").await;

    let remaining = LedgerService::new(&ctx_state.db.balances)
        .zero_if_unclaimed(&key, Amount::from_units(6))
        .await
        .unwrap();
    assert_eq!(remaining, Amount::from_units(4));
});

test_with_server!(treasury_accounts_exist_after_migrations, |_server, ctx_state, _config, _rail| {
    for pool in [TREASURY_REVIEWER_POOL, TREASURY_PLATFORM] {
        let account = ctx_state
            .db
            .balances
            .get(&AccountKey::treasury(pool))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.kind, AccountKind::TreasuryPool);
        assert_eq!(account.balance, Amount::ZERO);
        assert!(!account.is_payout_eligible());
    }
});

test_with_server!(owner_sets_payout_threshold, |server, ctx_state, _config, _rail| {
    let reviewer = create_reviewer(&ctx_state, None).await;
    let bearer = format!("Bearer {}", reviewer_token(&ctx_state, &reviewer));

    let response = server
        .post("/api/users/me/payout_threshold")
        .add_header("Authorization", bearer.clone())
        .json(&serde_json::json!({ "threshold": "12.5" }))
        .await;
    response.assert_status_success();
    let view = response.json::<BalanceView>();
    assert_eq!(view.payout_threshold, Amount::from_micros(12_500_000));
    assert_eq!(view.kind, AccountKind::Reviewer);

    server
        .post("/api/users/me/payout_threshold")
        .add_header("Authorization", bearer.clone())
        .json(&serde_json::json!({ "threshold": "-1" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    server
        .post("/api/users/me/payout_threshold")
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .json(&serde_json::json!({ "threshold": "1" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
});

test_with_server!(balance_is_visible_to_owner_and_admin, |server, ctx_state, _config, _rail| {
    let owner = create_reviewer(&ctx_state, None).await;
    let other = create_reviewer(&ctx_state, None).await;
    let key = AccountKey::reviewer(owner.id.id.to_raw());
    credit(&ctx_state, &key, "0.25").await;
    let url = format!("/api/balances/reviewer/{}", owner.id.id.to_raw());

    let response = server
        .get(&url)
        .add_header("Authorization", format!("Bearer {}", reviewer_token(&ctx_state, &owner)))
        .await;
    response.assert_status_success();
    assert_eq!(response.json::<BalanceView>().balance, Amount::from_micros(250_000));

    server
        .get(&url)
        .add_header("Authorization", format!("Bearer {}", reviewer_token(&ctx_state, &other)))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .get(&url)
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await
        .assert_status_success();

    server
        .get("/api/balances/wallet/abc")
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server.get(&url).await.assert_status(StatusCode::UNAUTHORIZED);
});

test_with_server!(query_revenue_is_split_three_ways, |server, ctx_state, _config, _rail| {
    let supplier = create_supplier(&ctx_state, Some("0xsupplier")).await;
    let package = create_package(&ctx_state, &supplier, "0.10").await;
    let url = format!(
        "/api/admin/packages/{}/query_revenue",
        package.id.id.to_raw()
    );

    let response = server
        .post(&url)
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await;
    response.assert_status_success();
    let shares = response.json::<RevenueShares>();
    assert_eq!(shares.supplier, Amount::from_micros(70_000));
    assert_eq!(shares.reviewer_pool, Amount::from_micros(20_000));
    assert_eq!(shares.platform, Amount::from_micros(10_000));

    let balances = &ctx_state.db.balances;
    let supplier_key = AccountKey::supplier(supplier.id.id.to_raw());
    assert_eq!(
        balances.get(&supplier_key).await.unwrap().unwrap().balance,
        Amount::from_micros(70_000)
    );
    assert_eq!(
        balances
            .get(&AccountKey::treasury(TREASURY_REVIEWER_POOL))
            .await
            .unwrap()
            .unwrap()
            .balance,
        Amount::from_micros(20_000)
    );
    assert_eq!(
        balances
            .get(&AccountKey::treasury(TREASURY_PLATFORM))
            .await
            .unwrap()
            .unwrap()
            .balance,
        Amount::from_micros(10_000)
    );

    let supplier_bearer = format!(
        "Bearer {}",
        token(&ctx_state, CallerRole::Supplier, &supplier.id.id.to_raw())
    );
    server
        .post(&url)
        .add_header("Authorization", supplier_bearer)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    ctx_state
        .db
        .suppliers
        .set_status(&supplier.id, SupplierStatus::Inactive)
        .await
        .unwrap();
    server
        .post(&url)
        .add_header("Authorization", format!("Bearer {}", admin_token(&ctx_state)))
        .await
        .assert_status(StatusCode::GONE);
    assert_eq!(
        balances.get(&supplier_key).await.unwrap().unwrap().balance,
        Amount::from_micros(70_000)
    );
});
