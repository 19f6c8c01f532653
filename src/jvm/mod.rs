//! JDK and JRE layer assembly

pub mod extract;
pub mod jdk;
pub mod jre;
pub mod version;

pub use extract::extract_archive;
pub use jdk::Jdk;
pub use jre::Jre;
pub use version::{is_before_java9, keystore_path, RuntimeKind};
