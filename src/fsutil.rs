//! Directory copy helpers for baseline promotion.

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Recursively copy `src` into `dst`, creating `dst` as needed. Top-level
/// entries of `src` whose names appear in `skip` are left out.
pub fn copy_dir_all(src: &Path, dst: &Path, skip: &[&str]) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;
    for item in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let item = item.map_err(|e| Error::io(src, e))?;
        let name = item.file_name();
        if skip.iter().any(|s| name.as_os_str() == *s) {
            continue;
        }
        let from = item.path();
        let to = dst.join(&name);
        let file_type = item.file_type().map_err(|e| Error::io(&from, e))?;
        if file_type.is_dir() {
            copy_dir_all(&from, &to, &[])?;
        } else {
            fs::copy(&from, &to).map_err(|e| Error::io(&from, e))?;
        }
    }
    Ok(())
}

/// Make `dst` an exact copy of `src`, removing whatever `dst` held before.
pub fn replace_dir(src: &Path, dst: &Path, skip: &[&str]) -> Result<()> {
    remove_dir_if_exists(dst)?;
    copy_dir_all(src, dst, skip)
}

pub fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_copies_tree_and_drops_old_content() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("nested")).unwrap();
        fs::write(src.path().join("a.png"), b"a").unwrap();
        fs::write(src.path().join("nested/b.png"), b"b").unwrap();
        fs::create_dir(src.path().join("expected")).unwrap();
        fs::write(dst.path().join("old.png"), b"old").unwrap();

        replace_dir(src.path(), dst.path(), &["expected"]).unwrap();

        assert_eq!(fs::read(dst.path().join("a.png")).unwrap(), b"a");
        assert_eq!(fs::read(dst.path().join("nested/b.png")).unwrap(), b"b");
        assert!(!dst.path().join("old.png").exists());
        assert!(!dst.path().join("expected").exists());
    }
}
