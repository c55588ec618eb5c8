//! Control engine root.
//!
//! Per-segment PD pose control and per-joint wrap-safe angle limiting.
//! Within one tick every limiter runs before any pose controller.

pub mod limiter;
pub mod pose;
