//! Integration tests for jvmlayer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn jvmlayer() -> Command {
        let mut cmd = cargo_bin_cmd!("jvmlayer");
        cmd.env_remove("BP_JAVA_VERSION")
            .env_remove("JVMLAYER_CONFIG");
        cmd
    }

    fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("config.toml");
        let header = format!(
            "[build]\nlayers_dir = {:?}\nstack = \"test-stack-id\"\n\n[cache]\ndownload_dir = {:?}\n\n[certificates]\nfile = {:?}\n\n",
            dir.join("layers").display().to_string(),
            dir.join("downloads").display().to_string(),
            dir.join("ca-certificates.crt").display().to_string(),
        );
        fs::write(&path, format!("{}{}", header, body)).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        jvmlayer()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cacheable JDK/JRE layers"));
    }

    #[test]
    fn version_displays() {
        jvmlayer()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("jvmlayer"));
    }

    #[test]
    fn layers_empty() {
        let temp = TempDir::new().unwrap();
        jvmlayer()
            .args(["layers", "--layers-dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No layers"));
    }

    #[test]
    fn build_without_plan_entries() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "");

        jvmlayer()
            .arg("--config")
            .arg(&config)
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("No layers requested"));
    }

    #[test]
    fn build_without_candidates_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "[[plan.entries]]\nname = \"jdk\"\n");

        jvmlayer()
            .arg("--config")
            .arg(&config)
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unable to find dependency"))
            .stderr(predicate::str::contains("No valid dependencies for jdk, 11.*, and test-stack-id"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        fs::write(&config, "[build\n").unwrap();

        jvmlayer()
            .arg("--config")
            .arg(&config)
            .arg("layers")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[cfg(unix)]
    mod end_to_end {
        use super::*;
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use sha2::{Digest, Sha256};

        fn write_jdk_archive(path: &Path, extra: &[(&str, &[u8])]) -> String {
            let encoder = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let base: [(&str, &[u8]); 3] = [
                ("jdk-11.0.0/release", b"JAVA_VERSION=\"11.0.0\"\n"),
                ("jdk-11.0.0/bin/keytool", b"#!/bin/sh\nexit 0\n"),
                ("jdk-11.0.0/lib/security/java.security", b"\n"),
            ];
            for &(name, content) in base.iter().chain(extra) {
                let mut header = tar::Header::new_gnu();
                header.set_size(content.len() as u64);
                header.set_mode(0o755);
                header.set_cksum();
                builder.append_data(&mut header, name, content).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();

            hex::encode(Sha256::digest(fs::read(path).unwrap()))
        }

        #[test]
        fn build_then_reuse() {
            let temp = TempDir::new().unwrap();
            let archive = temp.path().join("jdk-11.0.0.tar.gz");
            let sha256 = write_jdk_archive(&archive, &[]);
            let cert = rcgen::generate_simple_self_signed(vec!["corp.example".to_string()]).unwrap();
            fs::write(temp.path().join("ca-certificates.crt"), cert.cert.pem()).unwrap();

            let config = write_config(
                temp.path(),
                &format!(
                    "[[buildpack.dependencies]]\nid = \"jdk\"\nversion = \"11.0.0\"\nuri = \"file://{}\"\nsha256 = \"{}\"\nstacks = [\"test-stack-id\"]\n\n[[plan.entries]]\nname = \"jdk\"\n",
                    archive.display(),
                    sha256
                ),
            );

            jvmlayer()
                .arg("--config")
                .arg(&config)
                .args(["build", "--format", "json"])
                .assert()
                .success()
                .stdout(predicate::str::contains("\"name\": \"jdk\""));

            let layer = temp.path().join("layers").join("jdk");
            assert!(layer.join("release").is_file());
            assert_eq!(
                fs::read_to_string(layer.join("env.build").join("JAVA_HOME.override")).unwrap(),
                layer.display().to_string()
            );
            let record = fs::read_to_string(temp.path().join("layers").join("jdk.toml")).unwrap();

            jvmlayer()
                .arg("--config")
                .arg(&config)
                .args(["-v", "build"])
                .assert()
                .success()
                .stderr(predicate::str::contains("Reusing cached layer"));
            assert_eq!(
                fs::read_to_string(temp.path().join("layers").join("jdk.toml")).unwrap(),
                record
            );

            jvmlayer()
                .arg("--config")
                .arg(&config)
                .args(["layers", "--format", "plain"])
                .assert()
                .success()
                .stdout(predicate::str::diff("jdk\n"));
        }

        #[test]
        fn native_image_with_relative_layers_dir() {
            let temp = TempDir::new().unwrap();
            let archive = temp.path().join("jdk-11.0.0.tar.gz");
            let jdk_sha256 = write_jdk_archive(
                &archive,
                &[("jdk-11.0.0/bin/gu", &b"#!/bin/sh\necho \"$@\" > gu-args\n"[..])],
            );
            let svm = temp.path().join("svm-installable.jar");
            fs::write(&svm, b"svm").unwrap();
            let svm_sha256 = hex::encode(Sha256::digest(b"svm"));

            let config = temp.path().join("config.toml");
            fs::write(
                &config,
                format!(
                    "[build]\nlayers_dir = \"layers\"\nstack = \"test-stack-id\"\n\n\
                     [cache]\ndownload_dir = \"downloads\"\n\n\
                     [certificates]\nfile = \"absent.crt\"\n\n\
                     [[buildpack.dependencies]]\nid = \"jdk\"\nversion = \"11.0.0\"\nuri = \"file://{}\"\nsha256 = \"{}\"\n\n\
                     [[buildpack.dependencies]]\nid = \"native-image-svm\"\nversion = \"11.0.0\"\nuri = \"file://{}\"\nsha256 = \"{}\"\n\n\
                     [[plan.entries]]\nname = \"jdk\"\n[plan.entries.metadata]\nnative-image = true\n",
                    archive.display(),
                    jdk_sha256,
                    svm.display(),
                    svm_sha256
                ),
            )
            .unwrap();

            jvmlayer()
                .current_dir(temp.path())
                .arg("--config")
                .arg(&config)
                .arg("build")
                .assert()
                .success();

            let cwd = fs::canonicalize(temp.path()).unwrap();
            let layer = temp.path().join("layers").join("jdk");
            let args = fs::read_to_string(layer.join("gu-args")).unwrap();
            let local_file = args.trim().strip_prefix("install --local-file ").unwrap();
            assert!(Path::new(local_file).is_absolute());
            assert_eq!(fs::read(local_file).unwrap(), b"svm");

            let java_home = fs::read_to_string(layer.join("env.build").join("JAVA_HOME.override")).unwrap();
            assert!(Path::new(&java_home).is_absolute());
            assert_eq!(fs::canonicalize(&java_home).unwrap(), cwd.join("layers").join("jdk"));
        }
    }
}
