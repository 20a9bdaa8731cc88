//! Input/output helpers.
//!
//! - artifact writes into the asset directory (`write_output`)
//! - run manifest JSON export (`export`)

use std::fs;
use std::path::Path;

pub mod export;

pub use export::*;

/// Write (or overwrite) an output file and return its size.
///
/// The parent directory must already exist; we never create directories in
/// the asset tree.
pub fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<u64> {
    fs::write(path, bytes)?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_output_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.webp");
        assert_eq!(write_output(&path, b"first run").unwrap(), 9);
        assert_eq!(write_output(&path, b"2nd").unwrap(), 3);
        assert_eq!(fs::read(&path).unwrap(), b"2nd");
    }

    #[test]
    fn write_output_does_not_create_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("a.webp");
        assert!(write_output(&path, b"x").is_err());
    }
}
