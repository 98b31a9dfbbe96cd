//! Error types for the compositing core.

use std::path::PathBuf;

/// Errors produced by asset loading, geometry and compositing.
///
/// The pipeline never lets these escape a frame: each stage turns its
/// error into a logged no-op.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required image could not be found or decoded.
    #[error("missing asset {}", path.display())]
    MissingAsset {
        /// Path that was requested.
        path: PathBuf,
    },

    /// An overlay image without an alpha channel was offered for blending.
    #[error("asset {} has no alpha channel", path.display())]
    ChannelMismatch {
        /// Path of the rejected image.
        path: PathBuf,
    },

    /// A placement or resize target has unusable dimensions.
    #[error("degenerate geometry ({width}x{height})")]
    DegenerateGeometry {
        /// Requested width in pixels.
        width: i64,
        /// Requested height in pixels.
        height: i64,
    },

    /// No landmarks or mask were available for the current frame.
    #[error("empty perception result")]
    EmptyPerceptionResult,

    /// A filter name that is not in the registry.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// A background name that is not in the background table.
    #[error("unknown background: {0}")]
    UnknownBackground(String),

    /// Invalid configuration values.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An I/O error occurred while reading configuration or assets.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An asset file exists but does not decode.
    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let missing = Error::MissingAsset {
            path: PathBuf::from("filters/cat.png"),
        };
        assert!(missing.to_string().contains("filters/cat.png"));

        let degenerate = Error::DegenerateGeometry {
            width: 0,
            height: -4,
        };
        assert!(degenerate.to_string().contains("0x-4"));

        let unknown = Error::UnknownFilter("unicorn".to_string());
        assert!(unknown.to_string().contains("unicorn"));
    }
}
