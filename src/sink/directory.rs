//! Sink that writes items below an output directory.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{ExtractSink, ItemOutcome, ItemTarget, passive_target};
use crate::archive::{ArchiveItem, ExtractMode};
use crate::options::{ExtractOptions, OverwriteMode};

/// Materializes items as files and directories under an output directory,
/// preserving the archive's relative paths.
pub struct DirectorySink {
    out_dir: PathBuf,
    overwrite: OverwriteMode,
    junk_paths: bool,
    current: Option<BufWriter<File>>,
}

impl DirectorySink {
    /// Write below `out_dir`, applying the overwrite and junk-paths settings
    /// of `options`. Nothing is created until the first item arrives.
    ///
    /// # Arguments
    ///
    /// * `out_dir` - Root of the extracted tree
    /// * `options` - Only `overwrite` and `junk_paths` are read
    pub fn new(out_dir: impl Into<PathBuf>, options: &ExtractOptions) -> Self {
        Self {
            out_dir: out_dir.into(),
            overwrite: options.overwrite,
            junk_paths: options.junk_paths,
            current: None,
        }
    }

    /// Root directory items are written below.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn target_path(&self, item: &ArchiveItem) -> io::Result<PathBuf> {
        let relative = relative_path(&item.path)?;
        if self.junk_paths {
            let name = relative
                .file_name()
                .map(PathBuf::from)
                .unwrap_or(relative);
            return Ok(self.out_dir.join(name));
        }
        Ok(self.out_dir.join(relative))
    }
}

impl ExtractSink for DirectorySink {
    fn begin_item(&mut self, item: &ArchiveItem, mode: ExtractMode) -> io::Result<ItemTarget<'_>> {
        if mode == ExtractMode::Test {
            return Ok(passive_target(item, mode).unwrap_or(ItemTarget::Discard));
        }

        if item.is_folder {
            if !self.junk_paths {
                let dir = self.target_path(item)?;
                fs::create_dir_all(&dir)?;
                debug!(path = %dir.display(), "created directory");
            }
            return Ok(ItemTarget::Skip);
        }

        let path = self.target_path(item)?;
        if path.exists() {
            match self.overwrite {
                OverwriteMode::Overwrite => {}
                OverwriteMode::Skip => {
                    info!(path = %path.display(), "skipping existing file");
                    return Ok(ItemTarget::Skip);
                }
                OverwriteMode::Fail => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} already exists", path.display()),
                    ));
                }
            }
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        debug!(path = %path.display(), "writing file");
        Ok(ItemTarget::Write(self.current.insert(BufWriter::new(file))))
    }

    fn finish_item(&mut self, item: &ArchiveItem, outcome: ItemOutcome) -> io::Result<()> {
        if outcome == ItemOutcome::Failed && self.current.is_some() {
            // Partial output of a failed item stays on disk.
            debug!(path = %item.path, "keeping partially written file");
        }
        match self.current.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Turn an archive path into a relative path that cannot leave the output
/// directory. Both `/` and `\` count as separators, and no component may
/// carry a drive prefix (`C:evil.txt`).
fn relative_path(entry: &str) -> io::Result<PathBuf> {
    let invalid = |reason: &str| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsafe item path '{}': {}", entry, reason),
        )
    };

    if entry.starts_with(['/', '\\']) || Path::new(entry).is_absolute() {
        return Err(invalid("absolute path"));
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in entry.split(['/', '\\']) {
        match part {
            "" | "." => {}
            _ if part.contains(':') => return Err(invalid("drive prefix")),
            ".." => {
                if parts.pop().is_none() {
                    return Err(invalid("escapes the output directory"));
                }
            }
            _ => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(parts.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_normalized() {
        assert_eq!(relative_path("a/./b//c.txt").unwrap(), Path::new("a/b/c.txt"));
        assert_eq!(relative_path("a\\b\\c.txt").unwrap(), Path::new("a/b/c.txt"));
        assert_eq!(relative_path("a/x/../c.txt").unwrap(), Path::new("a/c.txt"));
        assert_eq!(relative_path("dir/").unwrap(), Path::new("dir"));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        assert!(relative_path("../etc/passwd").is_err());
        assert!(relative_path("a/../../b").is_err());
        assert!(relative_path("/etc/passwd").is_err());
        assert!(relative_path("\\windows").is_err());
        assert!(relative_path("./").is_err());
    }

    #[test]
    fn drive_prefixed_paths_are_rejected() {
        assert!(relative_path("C:evil.txt").is_err());
        assert!(relative_path("a/C:/b.txt").is_err());
        assert!(relative_path("C:\\windows\\evil.txt").is_err());
    }

    #[test]
    fn junk_paths_flatten_targets() {
        let sink = DirectorySink::new("/out", &ExtractOptions::default().junk_paths(true));
        let item = ArchiveItem {
            index: 0,
            path: "deep/nested/file.txt".into(),
            is_folder: false,
            size: 0,
            packed_size: 0,
            crc32: 0,
            method: crate::zip::CompressionMethod::Stored,
            modified: (0, 0),
        };
        assert_eq!(sink.target_path(&item).unwrap(), Path::new("/out/file.txt"));
    }
}
