//! Path safety (§4.8): any resolved path that escapes its bucket root is
//! rejected, and object keys may never carry a leading slash or `..`
//! segment.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub fn bucket_dir(root: &Path, bucket: &str) -> Result<PathBuf, StoreError> {
    validate_segment(bucket)?;
    Ok(root.join(bucket))
}

pub fn object_path(root: &Path, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
    validate_segment(bucket)?;
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") || key.is_empty() {
        return Err(StoreError::PathEscape);
    }
    let bucket_root = root.join(bucket);
    let resolved = bucket_root.join(key);
    if !resolved.starts_with(&bucket_root) {
        return Err(StoreError::PathEscape);
    }
    Ok(resolved)
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
        return Err(StoreError::PathEscape);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_parent_traversal() {
        let root = Path::new("/data");
        assert!(object_path(root, "b1", "../etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_leading_slash() {
        let root = Path::new("/data");
        assert!(object_path(root, "b1", "/etc/passwd").is_err());
    }

    #[test]
    fn test_accepts_nested_key() {
        let root = Path::new("/data");
        let resolved = object_path(root, "b1", "sub/dir/file.png").unwrap();
        assert_eq!(resolved, Path::new("/data/b1/sub/dir/file.png"));
    }
}
