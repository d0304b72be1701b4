//! Partner Map Dashboard - interactive buyer map over Salesforce data.
//!
//! At startup the dashboard logs in to Salesforce once, pulls the account,
//! material, order and cart tables, and joins them into one row per cart
//! item. The server then answers every request from that in-memory
//! snapshot.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`credentials`] - Salesforce login file
//! - [`queries`] - Stored SOQL query files
//! - [`salesforce`] - SOAP login and paginated REST queries
//! - [`pipeline`] - Inner joins into the denormalized cart table
//! - [`map`] - Control handlers: material choices and the buyer map
//! - [`routes`] - HTTP handlers
//! - [`startup`] - Fetch-and-join before the server binds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod credentials;
pub mod error;
pub mod map;
pub mod pipeline;
pub mod queries;
pub mod routes;
pub mod salesforce;
pub mod startup;
pub mod state;
