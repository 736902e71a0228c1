pub mod actor;
pub mod attestation;
pub mod audit;
pub mod comparison;
pub mod day;
pub mod day_status;
pub mod pay_period;
pub mod session;
pub mod snapshot;
pub mod time_range;
