//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements            | Connects to                 |
//! |----------------|-----------------------|-----------------------------|
//! | `cdev`         | OutputPin, InputPin   | Linux GPIO character device |
//! |                | EdgeWatch             |                             |
//! | `host_bridge`  | EventSink             | Mirror host (JSON on stdio) |
//! | `log_sink`     | EventSink             | Log output                  |

#[cfg(feature = "cdev")]
pub mod cdev;
pub mod host_bridge;
pub mod log_sink;
