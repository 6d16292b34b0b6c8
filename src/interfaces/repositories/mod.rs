pub mod balance_ifce;
pub mod data_package_ifce;
pub mod payout_ifce;
pub mod review_submission_ifce;
pub mod review_task_ifce;
pub mod reviewer_ifce;
pub mod supplier_ifce;
