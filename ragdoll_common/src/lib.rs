//! Ragdoll Common Library
//!
//! Shared constants, authoring configuration and state types for the
//! ragdoll pose control workspace. Contains no control logic; the
//! `ragdoll_control` crate consumes these types.
//!
//! # Module Structure
//!
//! - [`consts`] - Default gains, limits and capacity bounds
//! - [`config`] - Configuration loading trait, error and log level types
//! - [`figure`] - Per-figure authoring surface (segments, joints, collision policy)
//! - [`state`] - Mode and correction enums
//! - [`error`] - Per-segment fault bitflags
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use ragdoll_common::prelude::*;
//! use std::path::Path;
//!
//! let figure = FigureConfig::load(Path::new("config/humanoid.toml")).unwrap();
//! figure.validate().unwrap();
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod figure;
pub mod prelude;
pub mod state;
