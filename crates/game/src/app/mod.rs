mod autopilot;
pub(crate) mod bootstrap;
mod config;
mod demo_level;
pub(crate) mod loop_runner;
