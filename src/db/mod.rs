pub mod attestations;
pub mod audit;
pub mod days;
pub mod db_utils;
pub mod initialize;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod sessions;
pub mod settings;
pub mod stats;
