//! tickview-core library.
//!
//! Turns the JSON page documents served by a ticket tracker into template
//! view models, and drives in-place navigation between pages.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern in [`error`], each mapping to a
//!   stable [`error::ErrorCode`]; `anyhow::Result` for config loading.
//! - **Logging**: `tracing` macros (`debug!` for transitions, `warn!` for
//!   best-effort failures).

pub mod changes;
pub mod config;
pub mod error;
pub mod model;
pub mod nav;
pub mod render;
pub mod text;
pub mod time;
pub mod view;
