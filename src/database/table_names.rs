pub const SUPPLIER_TABLE_NAME: &str = "supplier";
pub const DATA_PACKAGE_TABLE_NAME: &str = "data_package";
pub const PACKAGE_QUALITY_TABLE_NAME: &str = "package_quality_score";
pub const REVIEWER_TABLE_NAME: &str = "reviewer";
pub const REVIEWER_STATS_TABLE_NAME: &str = "reviewer_stats";
pub const REVIEW_TASK_TABLE_NAME: &str = "review_task";
pub const REVIEW_SUBMISSION_TABLE_NAME: &str = "review_submission";
pub const BALANCE_TABLE_NAME: &str = "balance";
pub const PAYOUT_ATTEMPT_TABLE_NAME: &str = "payout_attempt";
pub const PAYOUT_RECORD_TABLE_NAME: &str = "payout_record";
pub const SETTLEMENT_RUN_TABLE_NAME: &str = "settlement_run";
