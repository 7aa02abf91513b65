//! Strata - A terminal viewer for manifest-driven data packages.
//!
//! A package describes itself with a manifest: a set of tab views (trees,
//! tables and charts built from named queries) and detail views that render
//! a single record as sections. Strata reads the manifest, fetches rows from
//! a query API or a package directory, and lays them out for the terminal.
//!
//! # Features
//!
//! - Hierarchy trees built from flat parent/child rows
//! - Nested-table charts with row and column spans
//! - Manifest-driven field formatting and detail sections
//! - Global search across every query named in the manifest
//! - Notes attached to records
//! - Vim-style keyboard shortcuts
//! - Gruvbox color themes
//! - Clipboard integration
//!
//! # Example
//!
//! ```ignore
//! use strata::config::ViewerConfig;
//! use strata::session::Session;
//! use strata::source::open_source;
//!
//! let config = ViewerConfig::default();
//! let source = open_source("./trilobase", &config.http)?;
//! let mut session = Session::load(source, config).await?;
//! session.switch_to_view("genera").await;
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod app;
pub mod clipboard;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod hierarchy;
pub mod manifest;
pub mod plain;
pub mod search;
pub mod session;
pub mod source;
pub mod ui;
pub mod views;

pub use error::{Result, StrataError};
