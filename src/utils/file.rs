use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Reads a UTF-8 text file into a string.
pub fn file_get(path: impl AsRef<Path>) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Writes `content` to `path` atomically.
///
/// The data goes to a temporary file in the destination directory, which is
/// then renamed over the target, so readers see either the old file or the
/// complete new one. Missing parent directories are created.
pub fn file_write_atomic(path: impl AsRef<Path>, content: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.yaml");

        file_write_atomic(&target, "a: 1\n".as_bytes()).unwrap();
        assert!(target.is_file());
        assert_eq!(file_get(&target).unwrap(), "a: 1\n");

        file_write_atomic(&target, "b: 2\n".as_bytes()).unwrap();
        assert_eq!(file_get(&target).unwrap(), "b: 2\n");
    }

    #[test]
    fn test_file_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_get(dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
