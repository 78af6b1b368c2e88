//! Directory discovery for batch builds.
//!
//! Only files whose extension maps to an [`ImageKind`] are returned. Output is
//! sorted so that the same directory always yields the same order, and with it
//! the same index ids.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::IngestError;
use crate::types::ImageKind;

/// List image files under `dir`, descending into subdirectories when
/// `recursive` is set.
pub fn discover_images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, IngestError> {
    let meta = fs::metadata(dir).map_err(|err| IngestError::io(dir, &err))?;
    if !meta.is_dir() {
        return Err(IngestError::Io {
            path: dir.display().to_string(),
            message: "not a directory".into(),
        });
    }

    let mut found = Vec::new();
    walk(dir, recursive, &mut found)?;
    found.sort();
    debug!(dir = %dir.display(), recursive, count = found.len(), "images_discovered");
    Ok(found)
}

fn walk(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), IngestError> {
    let entries = fs::read_dir(dir).map_err(|err| IngestError::io(dir, &err))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "directory_entry_unreadable");
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "directory_entry_unreadable");
                continue;
            }
        };

        if file_type.is_dir() {
            if recursive {
                walk(&path, recursive, out)?;
            }
        } else if ImageKind::from_path(&path).is_some() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn finds_supported_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("a.JPG"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested").join("c.gif"));

        let flat = discover_images(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);

        let deep = discover_images(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().any(|p| p.ends_with("nested/c.gif")));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_images(&missing, true),
            Err(IngestError::Io { .. })
        ));
    }

    #[test]
    fn file_instead_of_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.png");
        touch(&file);
        let err = discover_images(&file, false).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
