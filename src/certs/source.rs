//! Certificate sources: a bundle file and/or directories of certificate files

use crate::checksum::{sha256_bytes, sha256_file};
use crate::error::{JvmLayerError, JvmLayerResult};
use crate::layer::Fingerprint;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use x509_cert::der::Decode;

/// Fingerprint key for the bundle file digest
pub const CACERTS_SHA256_KEY: &str = "cacerts-sha256";

/// Fingerprint key for the certificate directory snapshot
pub const CERT_DIR_KEY: &str = "cert-dir";

/// A trusted certificate ready to be imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Keystore alias, derived from the source file name
    pub alias: String,
    /// DER encoding
    pub der: Vec<u8>,
    /// File the certificate was read from
    pub source: PathBuf,
    /// Subject distinguished name
    pub subject: String,
}

/// One file of a certificate directory as captured in the fingerprint
#[derive(Debug, Clone, Serialize)]
struct DirEntrySnapshot {
    path: String,
    sha256: String,
}

/// Configured certificate inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateSources {
    /// Single bundle file (e.g., `/etc/ssl/certs/ca-certificates.crt`)
    pub file: Option<PathBuf>,
    /// Directories of individual certificate files
    pub dirs: Vec<PathBuf>,
}

impl CertificateSources {
    pub fn new(file: Option<PathBuf>, dirs: Vec<PathBuf>) -> Self {
        Self { file, dirs }
    }

    /// Sources consisting of one bundle file
    pub fn bundle(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            dirs: Vec::new(),
        }
    }

    /// Record the certificate inputs into a layer fingerprint.
    ///
    /// A missing bundle or directory contributes nothing; any other read
    /// failure is an error.
    pub fn fingerprint(&self, fingerprint: &mut Fingerprint) -> JvmLayerResult<()> {
        if let Some(file) = &self.file {
            if file.is_file() {
                fingerprint.insert(CACERTS_SHA256_KEY, &sha256_file(file)?)?;
            } else {
                debug!(path = %file.display(), "Certificate bundle not present");
            }
        }

        let mut snapshot = Vec::new();
        for dir in self.existing_dirs() {
            for path in list_files(dir)? {
                let bytes = read(&path)?;
                snapshot.push(DirEntrySnapshot {
                    path: path.display().to_string(),
                    sha256: sha256_bytes(&bytes),
                });
            }
        }
        if !snapshot.is_empty() {
            fingerprint.insert(CERT_DIR_KEY, &snapshot)?;
        }

        Ok(())
    }

    /// Read every distinct certificate across all sources, in a stable order
    pub fn certificates(&self) -> JvmLayerResult<Vec<Certificate>> {
        let mut files = Vec::new();
        if let Some(file) = &self.file {
            if file.is_file() {
                files.push(file.clone());
            }
        }
        for dir in self.existing_dirs() {
            files.extend(list_files(dir)?);
        }

        let mut seen_der = HashSet::new();
        let mut used_aliases = BTreeSet::new();
        let mut certificates = Vec::new();

        for path in files {
            let ders = parse_pem_certificates(&path, &read(&path)?)?;
            if ders.is_empty() {
                debug!(path = %path.display(), "No certificates found, skipping");
                continue;
            }

            let stem = alias_stem(&path);
            let multiple = ders.len() > 1;
            for (index, der) in ders.into_iter().enumerate() {
                if !seen_der.insert(sha256_bytes(&der)) {
                    continue;
                }
                let subject = subject_of(&path, &der)?;

                let base = if multiple {
                    format!("{}-{:03}", stem, index)
                } else {
                    stem.clone()
                };
                let alias = unique_alias(&base, &used_aliases);
                used_aliases.insert(alias.clone());

                certificates.push(Certificate {
                    alias,
                    der,
                    source: path.clone(),
                    subject,
                });
            }
        }

        Ok(certificates)
    }

    fn existing_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.dirs.iter().filter(|d| d.is_dir())
    }
}

fn read(path: &Path) -> JvmLayerResult<Vec<u8>> {
    fs::read(path).map_err(|e| JvmLayerError::io(format!("reading {}", path.display()), e))
}

/// Regular files (symlinks followed) directly inside `dir`, sorted by name
fn list_files(dir: &Path) -> JvmLayerResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| JvmLayerError::io(format!("reading directory {}", dir.display()), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            JvmLayerError::io(format!("reading entry of {}", dir.display()), e)
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// DER bodies of all CERTIFICATE blocks in a PEM file
pub(crate) fn parse_pem_certificates(path: &Path, bytes: &[u8]) -> JvmLayerResult<Vec<Vec<u8>>> {
    let mut reader = bytes;
    rustls_pemfile::certs(&mut reader)
        .map(|cert| cert.map(|c| c.as_ref().to_vec()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| JvmLayerError::CertificateParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn subject_of(path: &Path, der: &[u8]) -> JvmLayerResult<String> {
    let certificate =
        x509_cert::Certificate::from_der(der).map_err(|e| JvmLayerError::CertificateParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(certificate.tbs_certificate.subject.to_string())
}

/// Lowercase file stem restricted to characters keytool keeps verbatim
fn alias_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "certificate".to_string()
    } else {
        sanitized
    }
}

fn unique_alias(base: &str, used: &BTreeSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
