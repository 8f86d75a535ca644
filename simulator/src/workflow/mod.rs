pub mod config;
pub mod gate;
pub mod import;
pub mod runner;
