// src/utils/fsio.rs
use std::{fs, io::Write, path::Path};

/// Atomically replace `path` with `bytes`.
/// Writes a sibling `.tmp` file, syncs it, then renames over the target, so a
/// failure at any step leaves the previous content in place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let written = (|| {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)
}

/// Create `path` with `content` unless it already exists.
/// Returns true when the file was created.
pub fn ensure_file(path: &Path, content: &[u8]) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_atomic(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_file_leaves_existing_content_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = dir.path().join("a.json");
        assert!(ensure_file(&p, b"[]").expect("create"));
        fs::write(&p, b"[1]").expect("overwrite");
        assert!(!ensure_file(&p, b"[]").expect("second"));
        assert_eq!(fs::read(&p).expect("read"), b"[1]");
    }

    #[test]
    fn write_atomic_replaces_and_cleans_tmp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = dir.path().join("nested").join("b.json");
        write_atomic(&p, b"one").expect("first");
        write_atomic(&p, b"two").expect("second");
        assert_eq!(fs::read(&p).expect("read"), b"two");
        assert!(!p.with_extension("tmp").exists());
    }
}
