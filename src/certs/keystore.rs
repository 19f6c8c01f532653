//! Java keystore access through the runtime's own `keytool`

use crate::certs::source::parse_pem_certificates;
use crate::effect::{Execution, Executor};
use crate::error::{JvmLayerError, JvmLayerResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Keystore password the JVM ships its default trust store with
pub const DEFAULT_STORE_PASSWORD: &str = "changeit";

/// Alias -> DER certificate of every entry in a keystore
pub type KeystoreEntries = BTreeMap<String, Vec<u8>>;

/// Drives `<java home>/bin/keytool` through an [`Executor`]
#[derive(Clone)]
pub struct KeyTool {
    path: PathBuf,
    executor: Arc<dyn Executor>,
}

impl KeyTool {
    pub fn new(path: impl Into<PathBuf>, executor: Arc<dyn Executor>) -> Self {
        Self {
            path: path.into(),
            executor,
        }
    }

    /// The keytool binary inside a Java home
    pub fn in_java_home(java_home: &Path, executor: Arc<dyn Executor>) -> Self {
        Self::new(java_home.join("bin").join("keytool"), executor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the entries of `keystore`; a keystore that does not exist yet is empty
    pub async fn list(&self, keystore: &Path, password: &str) -> JvmLayerResult<KeystoreEntries> {
        if !keystore.exists() {
            return Ok(KeystoreEntries::new());
        }

        let execution = Execution::new(&self.path).args([
            "-list".to_string(),
            "-rfc".to_string(),
            "-keystore".to_string(),
            keystore.display().to_string(),
            "-storepass".to_string(),
            password.to_string(),
        ]);
        let output = self.executor.execute(&execution).await?;
        parse_rfc_listing(keystore, &output.stdout)
    }

    /// Import the certificate stored in `file` under `alias`
    pub async fn import(
        &self,
        keystore: &Path,
        password: &str,
        alias: &str,
        file: &Path,
    ) -> JvmLayerResult<()> {
        let execution = Execution::new(&self.path).args([
            "-importcert".to_string(),
            "-trustcacerts".to_string(),
            "-noprompt".to_string(),
            "-alias".to_string(),
            alias.to_string(),
            "-keystore".to_string(),
            keystore.display().to_string(),
            "-storepass".to_string(),
            password.to_string(),
            "-file".to_string(),
            file.display().to_string(),
        ]);
        self.executor.execute(&execution).await?;
        Ok(())
    }
}

/// Parse `keytool -list -rfc` output into alias -> first certificate
pub(crate) fn parse_rfc_listing(keystore: &Path, stdout: &str) -> JvmLayerResult<KeystoreEntries> {
    let mut entries = KeystoreEntries::new();
    let mut alias: Option<String> = None;
    let mut block: Option<String> = None;

    for line in stdout.lines() {
        let line = line.trim_end();
        if let Some(name) = line.strip_prefix("Alias name:") {
            alias = Some(name.trim().to_lowercase());
            continue;
        }

        if line.starts_with("-----BEGIN CERTIFICATE-----") {
            block = Some(String::new());
        }
        if let Some(text) = block.as_mut() {
            text.push_str(line);
            text.push('\n');
        }
        if line.starts_with("-----END CERTIFICATE-----") {
            let Some(text) = block.take() else { continue };
            let Some(name) = alias.as_ref() else { continue };
            if entries.contains_key(name) {
                // Later certificates of a chain belong to the same alias
                continue;
            }
            if let Some(der) = parse_pem_certificates(keystore, text.as_bytes())?
                .into_iter()
                .next()
            {
                entries.insert(name.clone(), der);
            }
        }
    }

    if block.is_some() {
        return Err(JvmLayerError::CertificateParse {
            path: keystore.to_path_buf(),
            reason: "truncated certificate in keytool listing".to_string(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::testing::{generate_der, rfc_listing};
    use crate::effect::fake::FakeExecutor;
    use tempfile::TempDir;

    #[test]
    fn parses_listing_with_multiple_entries() {
        let first = generate_der("a.example");
        let second = generate_der("b.example");
        let stdout = rfc_listing(&[
            ("digicertglobalrootca [jdk]", first.as_slice()),
            ("Corp", second.as_slice()),
        ]);

        let entries = parse_rfc_listing(Path::new("cacerts"), &stdout).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["digicertglobalrootca [jdk]"], first);
        assert_eq!(entries["corp"], second);
    }

    #[test]
    fn empty_listing() {
        let stdout = "Keystore type: JKS\nKeystore provider: SUN\n\nYour keystore contains 0 entries\n";
        assert!(parse_rfc_listing(Path::new("cacerts"), stdout).unwrap().is_empty());
    }

    #[test]
    fn truncated_listing_is_error() {
        let stdout = "Alias name: corp\n-----BEGIN CERTIFICATE-----\nAQID\n";
        assert!(parse_rfc_listing(Path::new("cacerts"), stdout).is_err());
    }

    #[tokio::test]
    async fn import_argument_layout() {
        let temp = TempDir::new().unwrap();
        let keystore = temp.path().join("cacerts");
        let cert = temp.path().join("corp.der");
        std::fs::write(&cert, generate_der("corp.example")).unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let keytool = KeyTool::in_java_home(temp.path(), executor.clone());

        keytool
            .import(&keystore, DEFAULT_STORE_PASSWORD, "corp", &cert)
            .await
            .unwrap();

        let executions = executor.executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].command, temp.path().join("bin").join("keytool"));
        assert_eq!(executions[0].args[0], "-importcert");
        assert_eq!(executions[0].args[6], keystore.display().to_string());
        assert_eq!(executions[0].args[8], "changeit");
    }

    #[tokio::test]
    async fn missing_keystore_lists_empty_without_running_keytool() {
        let temp = TempDir::new().unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let keytool = KeyTool::in_java_home(temp.path(), executor.clone());

        let entries = keytool
            .list(&temp.path().join("absent"), DEFAULT_STORE_PASSWORD)
            .await
            .unwrap();
        assert!(entries.is_empty());
        assert!(executor.executions().is_empty());
    }
}
