pub mod cli;
pub mod config;
pub mod frontend;
pub mod logging;
pub mod runner;
