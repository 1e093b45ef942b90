//! Settings for extraction calls.

/// What directory extraction does when the target file already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Leave the existing file and skip the item.
    Skip,
    /// Fail the item.
    Fail,
}

/// Default decode chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Settings shared by every extraction call of a [`StreamExtractor`](crate::StreamExtractor).
///
/// # Example
///
/// ```
/// use streamzip::{ExtractOptions, OverwriteMode};
///
/// let options = ExtractOptions::default()
///     .overwrite(OverwriteMode::Skip)
///     .junk_paths(true);
/// assert_eq!(options.overwrite, OverwriteMode::Skip);
/// ```
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Policy for files that already exist below the output directory.
    pub overwrite: OverwriteMode,
    /// Write every file directly into the output directory, dropping the
    /// archive's directory structure. Folder items are skipped.
    pub junk_paths: bool,
    /// Size of the chunks items are decoded in.
    pub chunk_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwriteMode::default(),
            junk_paths: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ExtractOptions {
    /// Set what happens when a target file already exists.
    pub fn overwrite(mut self, mode: OverwriteMode) -> Self {
        self.overwrite = mode;
        self
    }

    /// Flatten every file into the output directory.
    pub fn junk_paths(mut self, junk: bool) -> Self {
        self.junk_paths = junk;
        self
    }

    /// Set the decode chunk size. Clamped to at least one byte.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let options = ExtractOptions::default()
            .overwrite(OverwriteMode::Skip)
            .junk_paths(true)
            .chunk_size(0);
        assert_eq!(options.overwrite, OverwriteMode::Skip);
        assert!(options.junk_paths);
        assert_eq!(options.chunk_size, 1);
    }

    #[test]
    fn defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.overwrite, OverwriteMode::Overwrite);
        assert!(!options.junk_paths);
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
