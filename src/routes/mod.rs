pub mod admin;
pub mod balances;
pub mod packages;
pub mod review_tasks;
pub mod reviewers;
pub mod users;
