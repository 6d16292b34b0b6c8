#[warn(unused_imports)]
#[macro_export]
macro_rules! test_with_server {
    ($name:ident, |$server:ident, $ctx_state:ident, $config:ident, $rail:ident| $body:block) => {

        #[tokio::test(flavor="multi_thread")]
        #[serial_test::serial]
        async fn $name() {
            use std::sync::Arc;
            use axum_test::{TestServer, TestServerConfig};
            use squidpro_server::config::AppConfig;
            use squidpro_server::database::client::{Database, DbConfig};
            use squidpro_server::entities::amount::Amount;
            use squidpro_server::middleware::mw_ctx::create_ctx_state;
            use squidpro_server::services::revenue_service::RevenueSplit;
            use futures::FutureExt;
            use std::panic::resume_unwind;

            let $config = AppConfig {
                db_namespace: "test".to_string(),
                db_database: "test".to_string(),
                db_password: None,
                db_username: None,
                db_url: "mem://".to_string(),
                jwt_secret: "secret".to_string(),
                payment_rail_url: "http://rail.invalid".to_string(),
                payment_rail_api_key: "".to_string(),
                payment_asset: "USDC".to_string(),
                payment_timeout_secs: 1,
                settlement_interval_secs: 3600,
                settlement_concurrency: 4,
                settlement_lock_secs: 120,
                consensus_redrive_interval_secs: 300,
                reviewer_payout_threshold: Amount::from_units(5),
                supplier_payout_threshold: Amount::from_units(25),
                revenue_split: RevenueSplit::default(),
                port: 8080,
                sentry_project_link: None,
            };

            let $rail = Arc::new($crate::helpers::MockPaymentRail::default());

            let $ctx_state = {
                let db = Database::connect(DbConfig {
                    url: &$config.db_url,
                    database: &$config.db_database,
                    namespace: &$config.db_namespace,
                    password: $config.db_password.as_deref(),
                    username: $config.db_username.as_deref(),
                })
                .await
                .unwrap();

                db.run_migrations().await.unwrap();
                create_ctx_state(db, &$config, $rail.clone())
            };

            let routes_all = squidpro_server::init::main_router(&$ctx_state.clone());

            let $server = TestServer::new_with_config(
                routes_all,
                TestServerConfig {
                    transport: None,
                    save_cookies: false,
                    expect_success_by_default: false,
                    restrict_requests_with_http_schema: false,
                    default_content_type: None,
                    default_scheme: None,
                },
            )
            .expect("Failed to create test server");

            let test_result = std::panic::AssertUnwindSafe(async {
                (|| async $body)().await;
            })
            .catch_unwind()
            .await;

            $ctx_state.clone().db.client
                .query(format!("REMOVE DATABASE {};",$config.db_database))
                .await
                .expect("failed to remove database");

            if let Err(panic) = test_result {
                resume_unwind(panic);
            }
        }
    };
}
