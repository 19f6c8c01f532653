//! Archive expansion into a layer directory

use crate::error::{JvmLayerError, JvmLayerResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Expand a tar or tar.gz archive into `destination`, dropping the first
/// `strip_components` path components of every entry.
pub async fn extract_archive(
    archive: PathBuf,
    destination: PathBuf,
    strip_components: usize,
) -> JvmLayerResult<()> {
    tokio::task::spawn_blocking(move || extract(&archive, &destination, strip_components))
        .await
        .map_err(|e| JvmLayerError::Internal(format!("extraction task failed: {}", e)))?
}

fn extract(archive: &Path, destination: &Path, strip_components: usize) -> JvmLayerResult<()> {
    let extract_err = |reason: String| JvmLayerError::Extract {
        path: destination.to_path_buf(),
        reason,
    };

    let mut file = File::open(archive)
        .map_err(|e| JvmLayerError::io(format!("opening {}", archive.display()), e))?;
    let gzipped = is_gzip(&mut file)
        .map_err(|e| JvmLayerError::io(format!("reading {}", archive.display()), e))?;

    fs::create_dir_all(destination)
        .map_err(|e| JvmLayerError::io(format!("creating {}", destination.display()), e))?;
    let root = fs::canonicalize(destination)
        .map_err(|e| JvmLayerError::io(format!("resolving {}", destination.display()), e))?;

    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut archive_reader = Archive::new(reader);
    archive_reader.set_preserve_permissions(true);

    let entries = archive_reader
        .entries()
        .map_err(|e| extract_err(e.to_string()))?;

    let mut count = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| extract_err(e.to_string()))?;
        let original = entry.path().map_err(|e| extract_err(e.to_string()))?.into_owned();

        let Some(relative) = strip(&original, strip_components).map_err(extract_err)? else {
            continue;
        };
        ensure_within(&root, &relative).map_err(extract_err)?;
        let target = root.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| JvmLayerError::io(format!("creating {}", parent.display()), e))?;
        }

        if entry.header().entry_type() == EntryType::Link {
            let link = entry
                .link_name()
                .map_err(|e| extract_err(e.to_string()))?
                .ok_or_else(|| extract_err(format!("hard link {} has no target", original.display())))?
                .into_owned();
            let Some(link_relative) = strip(&link, strip_components).map_err(extract_err)? else {
                return Err(extract_err(format!(
                    "hard link {} points outside the archive root",
                    original.display()
                )));
            };
            ensure_within(&root, &link_relative).map_err(extract_err)?;
            fs::hard_link(root.join(link_relative), &target)
                .map_err(|e| JvmLayerError::io(format!("linking {}", target.display()), e))?;
        } else {
            entry
                .unpack(&target)
                .map_err(|e| extract_err(format!("{}: {}", original.display(), e)))?;
        }
        count += 1;
    }

    debug!(
        archive = %archive.display(),
        destination = %destination.display(),
        entries = count,
        "Expanded archive"
    );
    Ok(())
}

fn is_gzip(file: &mut File) -> io::Result<bool> {
    let mut magic = [0u8; 2];
    let mut read = 0;
    while read < magic.len() {
        let n = file.read(&mut magic[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(read == magic.len() && magic == GZIP_MAGIC)
}

/// Reject `relative` when an already extracted symlink among its parents
/// resolves outside `root`; `root` must be canonical
fn ensure_within(root: &Path, relative: &Path) -> Result<(), String> {
    let mut current = root.to_path_buf();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        current.push(component);

        let is_symlink = fs::symlink_metadata(&current)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if !is_symlink {
            continue;
        }
        let resolved = fs::canonicalize(&current)
            .map_err(|e| format!("{}: unresolvable symlink: {}", relative.display(), e))?;
        if !resolved.starts_with(root) {
            return Err(format!(
                "{} escapes the destination through symlink {}",
                relative.display(),
                current.display()
            ));
        }
    }
    Ok(())
}

/// Path relative to the destination, or `None` when nothing is left after stripping
fn strip(path: &Path, strip_components: usize) -> Result<Option<PathBuf>, String> {
    let mut stripped = PathBuf::new();
    let components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .skip(strip_components);
    for component in components {
        match component {
            Component::Normal(part) => stripped.push(part),
            _ => return Err(format!("unsafe path in archive: {}", path.display())),
        }
    }
    Ok((!stripped.as_os_str().is_empty()).then_some(stripped))
}
