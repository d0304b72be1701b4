//! Partner Map Core - Shared types library.
//!
//! This crate provides the types used across all partner map components:
//! - `dashboard` - Interactive buyer map served over HTTP
//! - `cli` - Command-line tools for fetching and exporting Salesforce data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Salesforce record ids, raw records, coordinates and the
//!   denormalized cart row

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
