#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for ratemeter
//!
//! This library drives live progress displays for long-running counted operations on
//! two interchangeable GUI surfaces: a plotted rate curve and a native progress widget.
//! Drawing itself is left to external backends; the library owns the statistics, the
//! redraw policy and the interaction with a host event loop it does not control.
//!
//! # Module Organization
//!
//! - [`counter`]: The progress counter contract, a basic counter and the meter text formatter
//! - [`stats`]: Sampling, rate smoothing, series history, axis scaling and redraw throttling
//! - [`host`]: Host event loop detection
//! - [`lifecycle`]: Instance registry and the close/cancel state machine
//! - [`render`]: Plot and widget renderers, backend traits and headless backends
//! - [`meter`]: [`GuiMeter`], which ties everything together per tick
//! - [`config`]: Serializable meter configuration
//! - [`commands`]: Command-line interface used by the `ratemeter` binary

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod config;
pub mod counter;
pub mod host;
pub mod lifecycle;
pub mod meter;
pub mod render;
pub mod stats;

pub use crate::commands::{Host, run};
pub use crate::config::MeterConfig;
pub use crate::meter::{GuiMeter, GuiOptions};
