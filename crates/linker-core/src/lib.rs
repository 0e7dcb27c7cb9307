//! Linker Core — shared error type, environment configuration, data paths.

pub mod config;
pub mod domain;
pub mod error;

pub use config::{DataPaths, Environment, LinkerConfig, ProtocolVersion};
pub use domain::{domain_of, UNKNOWN_DOMAIN};
pub use error::{Error, Result};
