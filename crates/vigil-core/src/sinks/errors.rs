use crate::errors::VigilError;

/// Failure reported by a single render sink.
///
/// Never propagates past dispatch: the dispatcher records it in the
/// [`super::DispatchReport`] and moves on to the next sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Render failed: {message}")]
    Render { message: String },

    #[error("Sink panicked: {message}")]
    Panicked { message: String },

    #[error("Failed to write panel: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SinkError {
    pub fn render(message: impl Into<String>) -> Self {
        SinkError::Render {
            message: message.into(),
        }
    }
}

impl VigilError for SinkError {
    fn error_code(&self) -> &'static str {
        match self {
            SinkError::Render { .. } => "SINK_RENDER_FAILED",
            SinkError::Panicked { .. } => "SINK_PANICKED",
            SinkError::Io { .. } => "SINK_IO_ERROR",
        }
    }
}
