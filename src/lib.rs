//! Mirror PIR library.
//!
//! Exposes the presence controller and its adapters for the daemon binary
//! and for integration testing.  Everything that needs a real GPIO chip
//! is guarded by the `cdev` feature.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod gpio;
pub mod runner;

pub mod adapters;
pub mod drivers;
