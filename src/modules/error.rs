use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no image is open")]
    NoImage,
}

impl EditorError {
    /// Heading used by the message dialog that reports this error.
    pub fn title(&self) -> &'static str {
        match self {
            EditorError::InvalidParameter(_) => "Invalid Value",
            EditorError::UnsupportedFormat(_) => "Unsupported Format",
            EditorError::Io(_) => "File Error",
            EditorError::NoImage => "No Image",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EditorError::InvalidParameter(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        EditorError::UnsupportedFormat(msg.into())
    }
}

impl From<image::ImageError> for EditorError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => EditorError::Io(e),
            image::ImageError::Parameter(e) => EditorError::InvalidParameter(e.to_string()),
            other => EditorError::UnsupportedFormat(other.to_string()),
        }
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
