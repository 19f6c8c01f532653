//! Trust-store population
//!
//! Ensures a keystore holds every configured certificate exactly once.
//! Entries are only ever added: an alias that already holds the same
//! certificate is skipped, an alias that holds a different one is an error.

use crate::certs::keystore::{KeyTool, DEFAULT_STORE_PASSWORD};
use crate::certs::source::CertificateSources;
use crate::error::{JvmLayerError, JvmLayerResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Outcome of a load, by alias
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
}

/// Loads certificates from [`CertificateSources`] into one keystore
#[derive(Clone)]
pub struct CertificateLoader {
    keytool: KeyTool,
    sources: CertificateSources,
    destination: PathBuf,
}

impl CertificateLoader {
    pub fn new(keytool: KeyTool, sources: CertificateSources, destination: PathBuf) -> Self {
        Self {
            keytool,
            sources,
            destination,
        }
    }

    pub async fn load(&self) -> JvmLayerResult<LoadReport> {
        let certificates = self.sources.certificates()?;
        let mut report = LoadReport::default();
        if certificates.is_empty() {
            debug!("No certificates configured");
            return Ok(report);
        }

        let existing = self.keytool.list(&self.destination, DEFAULT_STORE_PASSWORD).await?;

        let mut pending = Vec::new();
        for certificate in certificates {
            match existing.get(&certificate.alias) {
                Some(der) if *der == certificate.der => report.skipped.push(certificate.alias),
                Some(_) => {
                    return Err(JvmLayerError::AliasConflict {
                        keystore: self.destination.clone(),
                        alias: certificate.alias,
                    })
                }
                None => pending.push(certificate),
            }
        }

        if pending.is_empty() {
            debug!(
                keystore = %self.destination.display(),
                skipped = report.skipped.len(),
                "Trust store already up to date"
            );
            return Ok(report);
        }

        info!(
            "Adding {} CA certificates to {}",
            pending.len(),
            self.destination.display()
        );

        let scratch_dir = self.destination.parent().unwrap_or_else(|| Path::new("."));
        for certificate in pending {
            debug!(alias = %certificate.alias, subject = %certificate.subject, "Importing certificate");

            let mut file = NamedTempFile::new_in(scratch_dir)
                .map_err(|e| JvmLayerError::io("creating certificate temp file", e))?;
            file.write_all(&certificate.der)
                .and_then(|_| file.flush())
                .map_err(|e| JvmLayerError::io("writing certificate temp file", e))?;

            self.keytool
                .import(
                    &self.destination,
                    DEFAULT_STORE_PASSWORD,
                    &certificate.alias,
                    file.path(),
                )
                .await?;
            report.added.push(certificate.alias);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::testing::{generate_der, generate_pem};
    use crate::effect::fake::FakeExecutor;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        executor: Arc<FakeExecutor>,
        loader: CertificateLoader,
        keystore: PathBuf,
    }

    fn fixture(bundle_content: &str) -> Fixture {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("ca-certificates.crt");
        fs::write(&bundle, bundle_content).unwrap();

        let security = temp.path().join("lib").join("security");
        fs::create_dir_all(&security).unwrap();
        let keystore = security.join("cacerts");

        let executor = Arc::new(FakeExecutor::new());
        let keytool = KeyTool::in_java_home(temp.path(), executor.clone());
        let loader = CertificateLoader::new(
            keytool,
            CertificateSources::bundle(&bundle),
            keystore.clone(),
        );

        Fixture {
            _temp: temp,
            executor,
            loader,
            keystore,
        }
    }

    #[tokio::test]
    async fn loads_every_certificate() {
        let f = fixture(&format!("{}{}", generate_pem("a.example"), generate_pem("b.example")));

        let report = f.loader.load().await.unwrap();

        assert_eq!(report.added, vec!["ca-certificates-000", "ca-certificates-001"]);
        assert!(report.skipped.is_empty());
        assert_eq!(f.executor.keystore(&f.keystore).len(), 2);
    }

    #[tokio::test]
    async fn reloading_adds_zero_entries() {
        let f = fixture(&format!("{}{}", generate_pem("a.example"), generate_pem("b.example")));
        f.loader.load().await.unwrap();
        let imports_before = f.executor.executions_of("keytool").len();

        let report = f.loader.load().await.unwrap();

        assert!(report.added.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(f.executor.keystore(&f.keystore).len(), 2);
        // Only the listing ran the second time
        assert_eq!(f.executor.executions_of("keytool").len(), imports_before + 1);
    }

    #[tokio::test]
    async fn keeps_runtime_defaults() {
        let f = fixture(&generate_pem("a.example"));
        f.executor
            .seed_keystore(&f.keystore, "digicertglobalrootca [jdk]", generate_der("default.example"));

        f.loader.load().await.unwrap();

        let entries = f.executor.keystore(&f.keystore);
        assert!(entries.contains_key("digicertglobalrootca [jdk]"));
        assert!(entries.contains_key("ca-certificates"));
    }

    #[tokio::test]
    async fn alias_with_different_content_is_conflict() {
        let f = fixture(&generate_pem("a.example"));
        f.executor
            .seed_keystore(&f.keystore, "ca-certificates", generate_der("other.example"));

        let err = f.loader.load().await.unwrap_err();
        assert!(matches!(err, JvmLayerError::AliasConflict { .. }));
    }

    #[tokio::test]
    async fn keytool_failure_aborts_load() {
        let f = fixture(&generate_pem("a.example"));
        f.executor.fail_command("keytool");

        let err = f.loader.load().await.unwrap_err();
        assert!(matches!(err, JvmLayerError::CommandExit { .. }));
    }

    #[tokio::test]
    async fn no_sources_runs_nothing() {
        let temp = TempDir::new().unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let loader = CertificateLoader::new(
            KeyTool::in_java_home(temp.path(), executor.clone()),
            CertificateSources::bundle(temp.path().join("absent.crt")),
            temp.path().join("cacerts"),
        );

        let report = loader.load().await.unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(executor.executions().is_empty());
    }
}
