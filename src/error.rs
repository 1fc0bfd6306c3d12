use thiserror::Error;

/// Conditions under which a widget cannot be drawn as a normal table.
///
/// None of these escape the public generators: they are turned into an
/// error panel so embedders always receive a well-formed image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("{0}")]
    ProfileInvalid(String),
    #[error("{0}")]
    EmptyDataset(String),
    #[error("{0}")]
    InvalidOption(String),
}

/// Failures reported by a [`crate::source::StudentSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Username '{0}' not found. Please check the spelling.")]
    NotFound(String),
    #[error("Rate limit exceeded. Please try again in a minute.")]
    RateLimited,
    #[error("42 API service is currently unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("malformed student data: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}

#[cfg(feature = "png")]
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("invalid SVG: {0}")]
    Parse(#[from] usvg::Error),
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
