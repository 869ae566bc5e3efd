//! A collaborative editor for RDFS vocabularies.
//!
//! Classes, properties and datatypes are arranged in three synchronized
//! trees (Domain, Property, Range) and changed by drag and drop. Sessions
//! share one document between any number of websocket clients.

pub use self::errors::Error;

pub mod app;
pub mod boot;
#[cfg(feature = "cli")]
pub mod cli;
pub mod collab;
pub mod config;
pub mod controller;
pub mod editor;
pub mod environment;
pub mod errors;
pub mod logger;
pub mod ontology;
pub mod projection;
#[cfg(any(test, feature = "testing"))]
pub mod tests_cfg;

#[cfg(feature = "testing")]
pub use axum_test::{TestResponse, TestServer};

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
