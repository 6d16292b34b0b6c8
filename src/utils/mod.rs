pub mod jwt;
pub mod payment_rail;
pub mod validate_utils;
