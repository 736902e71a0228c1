pub mod admin;
pub mod attestation;
pub mod audit;
pub mod comparison;
pub mod config;
pub mod context;
pub mod day;
pub mod interval;
pub mod log;
pub mod pay_period;
pub mod snapshot;
