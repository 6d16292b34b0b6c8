pub mod payment_rail;
pub mod repositories;
