//! CA certificate injection into a Java runtime's trust store

pub mod keystore;
pub mod loader;
pub mod source;

pub use keystore::{KeyTool, KeystoreEntries, DEFAULT_STORE_PASSWORD};
pub use loader::{CertificateLoader, LoadReport};
pub use source::{Certificate, CertificateSources, CACERTS_SHA256_KEY, CERT_DIR_KEY};
