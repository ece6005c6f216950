pub mod cli;
pub mod config;
pub mod error;
pub mod hub;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod telemetry;
pub mod ui;
pub mod waiter;
