pub mod config;
pub mod db;
pub mod forms;
pub mod seed;
pub mod server;
pub mod telemetry;
