use dotenvy;

use crate::entities::amount::Amount;
use crate::services::revenue_service::RevenueSplit;

#[derive(Debug)]
pub struct AppConfig {
    pub db_namespace: String,
    pub db_database: String,
    pub db_password: Option<String>,
    pub db_username: Option<String>,
    pub db_url: String,
    pub jwt_secret: String,
    pub payment_rail_url: String,
    pub payment_rail_api_key: String,
    pub payment_asset: String,
    pub payment_timeout_secs: u64,
    pub settlement_interval_secs: u64,
    pub settlement_concurrency: usize,
    pub settlement_lock_secs: u64,
    pub consensus_redrive_interval_secs: u64,
    pub reviewer_payout_threshold: Amount,
    pub supplier_payout_threshold: Amount,
    pub revenue_split: RevenueSplit,
    pub port: u16,
    pub sentry_project_link: Option<String>,
}

fn number_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).map_or(default, |value| {
        value
            .parse::<T>()
            .unwrap_or_else(|_| panic!("{name} must be number"))
    })
}

fn amount_var(name: &str, default: &str) -> Amount {
    std::env::var(name)
        .unwrap_or(default.to_string())
        .parse::<Amount>()
        .unwrap_or_else(|_| panic!("{name} must be a decimal amount"))
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let db_namespace = std::env::var("DB_NAMESPACE").unwrap_or("squidpro".to_string());
        let db_database = std::env::var("DB_DATABASE").unwrap_or("marketplace".to_string());
        let db_password = std::env::var("DB_PASSWORD").ok();
        let db_username = std::env::var("DB_USERNAME").ok();
        let db_url = std::env::var("DB_URL").expect("Missing DB_URL in env");

        let jwt_secret = std::env::var("JWT_SECRET").expect("Missing JWT_SECRET in env");

        let payment_rail_url =
            std::env::var("PAYMENT_RAIL_URL").expect("Missing PAYMENT_RAIL_URL in env");
        let payment_rail_api_key = std::env::var("PAYMENT_RAIL_API_KEY").unwrap_or_default();
        let payment_asset = std::env::var("PAYMENT_ASSET").unwrap_or("USDC".to_string());
        let payment_timeout_secs = number_var("PAYMENT_TIMEOUT_SECS", 20);

        let settlement_interval_secs = number_var("SETTLEMENT_INTERVAL_SECS", 3600);
        let settlement_concurrency = number_var("SETTLEMENT_CONCURRENCY", 4);
        let settlement_lock_secs = number_var("SETTLEMENT_LOCK_SECS", 120);
        let consensus_redrive_interval_secs = number_var("CONSENSUS_REDRIVE_INTERVAL_SECS", 300);

        let reviewer_payout_threshold = amount_var("REVIEWER_PAYOUT_THRESHOLD", "5.00");
        let supplier_payout_threshold = amount_var("SUPPLIER_PAYOUT_THRESHOLD", "25.00");

        let defaults = RevenueSplit::default();
        let revenue_split = RevenueSplit::new(
            number_var("SUPPLIER_SPLIT_BPS", defaults.supplier_bps),
            number_var("REVIEWER_SPLIT_BPS", defaults.reviewer_pool_bps),
        )
        .expect("SUPPLIER_SPLIT_BPS + REVIEWER_SPLIT_BPS must not exceed 10000");

        let port = number_var("PORT", 8080);
        let sentry_project_link = std::env::var("SENTRY_PROJECT_LINK").ok();

        Self {
            db_namespace,
            db_database,
            db_password,
            db_username,
            db_url,
            jwt_secret,
            payment_rail_url,
            payment_rail_api_key,
            payment_asset,
            payment_timeout_secs,
            settlement_interval_secs,
            settlement_concurrency,
            settlement_lock_secs,
            consensus_redrive_interval_secs,
            reviewer_payout_threshold,
            supplier_payout_threshold,
            revenue_split,
            port,
            sentry_project_link,
        }
    }
}
