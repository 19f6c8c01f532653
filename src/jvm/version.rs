//! Runtime layout by Java version

use crate::dependency::parse_lenient;
use std::path::{Path, PathBuf};

/// Which kind of runtime a layer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Jdk,
    Jre,
}

/// True for Java 8 and earlier; unparsable versions count as modern
pub fn is_before_java9(version: &str) -> bool {
    parse_lenient(version).is_some_and(|v| v.major < 9)
}

/// Location of the default trust store inside a runtime home.
///
/// A Java 8 JDK nests its runtime under `jre/`; Java 9+ JDKs and every
/// JRE keep it at `lib/security/cacerts`.
pub fn keystore_path(home: &Path, kind: RuntimeKind, version: &str) -> PathBuf {
    let security = match kind {
        RuntimeKind::Jdk if is_before_java9(version) => home.join("jre").join("lib"),
        _ => home.join("lib"),
    };
    security.join("security").join("cacerts")
}
