use thiserror::Error;

// Every fatal condition of a classification run. Configuration and alignment
// problems are detected before the scan starts, computation errors abort it.
#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("{0}")]
  Configuration(String),

  #[error("{0}")]
  Alignment(String),

  #[error("ndvi divide by zero at row {row}, column {col}")]
  Computation { row: usize, col: usize },

  #[error(transparent)]
  Gdal(#[from] gdal::errors::GdalError),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl ClassifyError {
  pub fn configuration<T: Into<String>>(message: T) -> Self {
    ClassifyError::Configuration(message.into())
  }

  pub fn alignment<T: Into<String>>(message: T) -> Self {
    ClassifyError::Alignment(message.into())
  }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
