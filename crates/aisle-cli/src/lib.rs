//! Aisle CLI - a terminal search screen.
//!
//! The `aisle` binary plays the renderer role: it forwards user input to a
//! [`aisle_core::SearchSession`] and prints the snapshots it publishes.
//!
//! - [`config`] - command line and layered configuration
//! - [`interactive`] - line commands for `aisle interactive`
//! - [`render`] - snapshot formatting

pub mod config;
pub mod interactive;
pub mod render;

pub use config::{Command, Config, FacetArgs, Settings};
