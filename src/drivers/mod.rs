//! Display power drivers and the worker that runs them.

pub mod display_command;
pub mod display_worker;
pub mod relay;
