//! Recording executor for tests
//!
//! Records every execution and emulates just enough of `keytool` to make
//! trust-store loading observable: `-list -rfc` and `-importcert` operate on
//! an in-memory map per keystore path. Every other command succeeds silently.

use crate::certs::keystore::KeystoreEntries;
use crate::certs::testing::rfc_listing;
use crate::effect::{ExecOutput, Execution, Executor};
use crate::error::{JvmLayerError, JvmLayerResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeExecutor {
    executions: Mutex<Vec<Execution>>,
    keystores: Mutex<BTreeMap<PathBuf, KeystoreEntries>>,
    failing: Mutex<BTreeSet<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every execution whose command file name is `name` exit with 1
    pub fn fail_command(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.lock().unwrap().clone()
    }

    /// Executions whose command file name is `name`
    pub fn executions_of(&self, name: &str) -> Vec<Execution> {
        self.executions()
            .into_iter()
            .filter(|e| command_name(&e.command) == name)
            .collect()
    }

    pub fn keystore(&self, path: &Path) -> KeystoreEntries {
        self.keystores
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Pre-populate a keystore; creates the keystore file when its directory exists
    pub fn seed_keystore(&self, path: &Path, alias: &str, der: Vec<u8>) {
        self.keystores
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default()
            .insert(alias.to_string(), der);
        touch(path);
    }

    fn keytool(&self, execution: &Execution) -> JvmLayerResult<ExecOutput> {
        let keystore = PathBuf::from(flag_value(execution, "-keystore")?);
        if !keystore.exists() {
            // A keystore deleted from disk starts over empty
            self.keystores.lock().unwrap().remove(&keystore);
        }

        if execution.args.iter().any(|a| a == "-list") {
            let entries = self.keystore(&keystore);
            let listing: Vec<(&str, &[u8])> = entries
                .iter()
                .map(|(alias, der)| (alias.as_str(), der.as_slice()))
                .collect();
            return Ok(ExecOutput {
                stdout: rfc_listing(&listing),
                stderr: String::new(),
            });
        }

        if execution.args.iter().any(|a| a == "-importcert") {
            let alias = flag_value(execution, "-alias")?.to_lowercase();
            let file = flag_value(execution, "-file")?;
            let der = std::fs::read(file).map_err(|e| JvmLayerError::io("reading cert", e))?;

            let mut keystores = self.keystores.lock().unwrap();
            let entries = keystores.entry(keystore.clone()).or_default();
            if entries.contains_key(&alias) {
                return Err(JvmLayerError::CommandExit {
                    command: execution.display(),
                    code: 1,
                    output: format!(
                        "keytool error: java.lang.Exception: Certificate not imported, alias <{}> already exists",
                        alias
                    ),
                });
            }
            entries.insert(alias, der);
            drop(keystores);
            touch(&keystore);
        }

        Ok(ExecOutput::default())
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, execution: &Execution) -> JvmLayerResult<ExecOutput> {
        self.executions.lock().unwrap().push(execution.clone());

        let name = command_name(&execution.command);
        if self.failing.lock().unwrap().contains(&name) {
            return Err(JvmLayerError::CommandExit {
                command: execution.display(),
                code: 1,
                output: format!("{} failed", name),
            });
        }

        match name.as_str() {
            "keytool" => self.keytool(execution),
            _ => Ok(ExecOutput::default()),
        }
    }
}

fn command_name(command: &Path) -> String {
    command
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn flag_value<'a>(execution: &'a Execution, flag: &str) -> JvmLayerResult<&'a str> {
    execution
        .args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| execution.args.get(i + 1))
        .map(String::as_str)
        .ok_or_else(|| JvmLayerError::Internal(format!("missing {} argument", flag)))
}

fn touch(path: &Path) {
    if path.parent().is_some_and(Path::is_dir) && !path.exists() {
        std::fs::write(path, b"").unwrap();
    }
}
