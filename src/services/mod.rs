pub mod consensus_service;
pub mod ledger_service;
pub mod package_quality_service;
pub mod reputation_service;
pub mod revenue_service;
pub mod settlement_service;
pub mod submission_service;
