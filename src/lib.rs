//! jvmlayer - cacheable JDK/JRE layers
//!
//! Resolves Java runtimes, expands them into layer directories, loads CA
//! certificates into their trust stores and reuses a layer whenever the
//! fingerprint of its inputs is unchanged.

pub mod build;
pub mod cache;
pub mod certs;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod effect;
pub mod error;
pub mod jvm;
pub mod layer;

pub use error::{JvmLayerError, JvmLayerResult};
