use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use squidpro_server::config::AppConfig;
use squidpro_server::database::client::{Database, DbConfig};
use squidpro_server::middleware::error::AppResult;
use squidpro_server::middleware::mw_ctx::create_ctx_state;
use squidpro_server::utils::payment_rail::HttpPaymentRail;
use squidpro_server::{init, jobs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let _sentry_guard = config.sentry_project_link.as_ref().map(|link| {
        sentry::init((
            link.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let db = Database::connect(DbConfig {
        url: &config.db_url,
        database: &config.db_database,
        namespace: &config.db_namespace,
        password: config.db_password.as_deref(),
        username: config.db_username.as_deref(),
    })
    .await?;
    db.run_migrations().await?;

    let payment_rail = HttpPaymentRail::new(
        &config.payment_rail_url,
        &config.payment_rail_api_key,
        &config.payment_asset,
    );
    let ctx_state = create_ctx_state(db, &config, Arc::new(payment_rail));

    let _settlement_job =
        jobs::settlement::run(ctx_state.clone(), ctx_state.settlement_interval).await;
    let _redrive_job =
        jobs::consensus_redrive::run(ctx_state.clone(), ctx_state.redrive_interval).await;

    let routes_all = init::main_router(&ctx_state);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    tracing::info!("->> LISTENING on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| squidpro_server::middleware::error::AppError::Generic {
            description: err.to_string(),
        })?;

    axum::serve(listener, routes_all.into_make_service())
        .await
        .map_err(|err| squidpro_server::middleware::error::AppError::Generic {
            description: err.to_string(),
        })?;

    Ok(())
}
