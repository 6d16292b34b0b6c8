pub mod consensus_redrive;
pub mod settlement;
