use thiserror::Error;

/// Errors produced while decoding a map file.
#[derive(Debug, Error)]
pub enum MapError {
    /// Bad magic or version, a corrupt compressed block, or any other
    /// structural inconsistency.
    #[error("Invalid map format: {0}")]
    Format(String),

    /// A read ran past the end of the region it was bounded to.
    #[error("Unexpected end of input while reading {context}")]
    Truncated { context: &'static str },

    /// A data index that is not the -1 sentinel but names no data block.
    #[error("Data block {index} out of range ({count} blocks)")]
    DataIndex { index: i32, count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;

impl MapError {
    #[inline]
    pub fn format(msg: impl Into<String>) -> Self { Self::Format(msg.into()) }

    /// Classifies a binrw failure: running out of bytes is a truncation,
    /// everything else is a format violation.
    pub fn from_binrw(err: binrw::Error, context: &'static str) -> Self {
        if err.is_eof() {
            Self::Truncated { context }
        } else {
            Self::Format(format!("{context}: {err}"))
        }
    }
}
