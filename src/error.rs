use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by archive handles and the extraction façade.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("automatic format detection is not supported for stream-backed archives")]
    UnsupportedFormat,

    #[error("failed to open archive: {0}")]
    ArchiveOpen(String),

    #[error("index {index} is out of range (archive has {count} items)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("cannot extract folder '{path}' (index {index}) to a buffer or stream")]
    CannotExtractFolder { index: usize, path: String },

    #[error("{0}")]
    ExtractionFailed(ExtractionFailure),
}

/// One item that did not extract or test cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub index: usize,
    pub path: String,
    pub message: String,
}

/// Every per-item failure of a single extraction or test pass, in the
/// order the items were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionFailure {
    failures: Vec<ItemFailure>,
}

impl ExtractionFailure {
    const FALLBACK_MESSAGE: &'static str = "extraction failed";

    pub(crate) fn new(failures: Vec<ItemFailure>) -> Self {
        Self { failures }
    }

    pub(crate) fn from_message(message: impl Into<String>) -> Self {
        Self {
            failures: vec![ItemFailure {
                index: 0,
                path: String::new(),
                message: message.into(),
            }],
        }
    }

    /// The headline message: the first recorded failure.
    pub fn message(&self) -> &str {
        self.failures
            .first()
            .map(|f| f.message.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(Self::FALLBACK_MESSAGE)
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())?;
        if self.failures.len() > 1 {
            write!(f, " (and {} more failed items)", self.failures.len() - 1)?;
        }
        Ok(())
    }
}

impl Error {
    pub(crate) fn archive_open(err: anyhow::Error) -> Self {
        Self::ArchiveOpen(format!("{err:#}"))
    }

    /// Per-item failures, when this is an extraction failure.
    pub fn item_failures(&self) -> &[ItemFailure] {
        match self {
            Self::ExtractionFailed(failure) => failure.failures(),
            _ => &[],
        }
    }
}
