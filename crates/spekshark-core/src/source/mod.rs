mod csv;

pub use csv::CsvFileSource;

use thiserror::Error;

/// One decoded serial byte with its start/end timestamps in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ByteFrame {
    pub byte: u8,
    pub start: f64,
    pub end: f64,
}

/// Ordered stream of byte-frames produced by an upstream serial decoder.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<ByteFrame>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {0}")]
    Csv(String),
}

impl From<csv::error::CsvSourceError> for SourceError {
    fn from(value: csv::error::CsvSourceError) -> Self {
        match value {
            csv::error::CsvSourceError::Io(err) => SourceError::Io(err),
            csv::error::CsvSourceError::Row { line, message } => {
                SourceError::Csv(format!("line {line}: {message}"))
            }
        }
    }
}
