use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("row {line}: {message}")]
    Row { line: usize, message: String },
}
