pub mod amount;
pub mod balance;
pub mod data_package;
pub mod payout;
pub mod review_submission;
pub mod review_task;
pub mod reviewer;
pub mod supplier;
