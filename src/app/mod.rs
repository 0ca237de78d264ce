//! Application core — presence-to-power decision logic, zero I/O.
//!
//! This module contains the rules that turn PIR edges, override switches
//! and host commands into display power requests.  All interaction with
//! hardware and the host happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod debounce;
pub mod events;
pub mod overrides;
pub mod ports;
pub mod service;
