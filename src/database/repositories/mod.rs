pub mod balance_repo;
pub mod data_package_repo;
pub mod payout_repo;
pub mod review_submission_repo;
pub mod review_task_repo;
pub mod reviewer_repo;
pub mod supplier_repo;
