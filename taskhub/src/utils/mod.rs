pub mod cli;
pub mod id;
pub mod state;
pub mod telemetry;
