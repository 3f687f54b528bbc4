//! Disk footprint accumulation.

use std::path::Path;

use log::trace;
use walkdir::WalkDir;

/// Sums the sizes of all regular files below `path`.
///
/// Symlinks are not followed, so a linked directory contributes nothing
/// and symlink cycles cannot cause runaway recursion. Entries that cannot
/// be read are skipped. A missing path has size zero.
pub fn dir_size(path: &Path) -> u64 {
    let mut total: u64 = 0;

    for entry in WalkDir::new(path).follow_links(false) {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                match entry.metadata() {
                    Ok(metadata) => total = total.saturating_add(metadata.len()),
                    Err(e) => trace!("Skipping {}: {}", entry.path().display(), e),
                }
            }
            Err(e) => trace!("Skipping unreadable entry under {}: {}", path.display(), e),
        }
    }

    total
}

/// Formats a byte count as a human-readable size.
///
/// # Example
///
/// ```
/// use depscope::store::format_size;
///
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_dir_size_sums_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(dir.path().join("lib/deep")).unwrap();
        fs::write(dir.path().join("lib/b.js"), vec![0u8; 250]).unwrap();
        fs::write(dir.path().join("lib/deep/c.js"), vec![0u8; 50]).unwrap();

        assert_eq!(dir_size(dir.path()), 400);
    }

    #[test]
    fn test_dir_size_missing_path() {
        let dir = TempDir::new().unwrap();
        assert_eq!(dir_size(&dir.path().join("nope")), 0);
    }

    #[test]
    fn test_dir_size_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(dir_size(dir.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_size_ignores_symlinked_dirs() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("index.js"), vec![0u8; 10]).unwrap();

        let pkg = dir.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("index.js"), vec![0u8; 7]).unwrap();
        std::os::unix::fs::symlink(&real, pkg.join("linked")).unwrap();
        std::os::unix::fs::symlink(&pkg, pkg.join("self")).unwrap();

        assert_eq!(dir_size(&pkg), 7);
    }
}
