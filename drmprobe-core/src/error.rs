//! Error types for drmprobe

use thiserror::Error;

/// Result type alias using ProbeError
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Main error type for drmprobe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A kernel DRM query failed
    #[error("DRM device error: {0}")]
    Device(String),

    /// EDID blob could not be parsed
    #[error("EDID error: {0}")]
    Edid(String),

    /// DRM property could not be read or decoded
    #[error("Property error: {0}")]
    Property(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Kernel object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProbeError>,
    },
}

impl ProbeError {
    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create an EDID error
    pub fn edid(msg: impl Into<String>) -> Self {
        Self::Edid(msg.into())
    }

    /// Create a property error
    pub fn property(msg: impl Into<String>) -> Self {
        Self::Property(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &ProbeError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// A short hint the CLI can print alongside the error
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::Device(_) => Some(
                "Check that /dev/dri/card* exists and that your user is in the 'video' group",
            ),
            Self::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                Some("Permission denied: add your user to the 'video' group or run as root")
            }
            Self::Io(_) => None,
            Self::Config(_) => {
                Some("Check ~/.config/drmprobe/config.toml, or run 'drmprobe config init'")
            }
            Self::NotFound(_) => Some("Run 'drmprobe scan' to list connected displays"),
            Self::Edid(_) | Self::Property(_) => None,
            Self::WithContext { .. } => None,
        }
    }

    /// Whether the user can fix this without a driver or code change
    pub fn is_user_recoverable(&self) -> bool {
        match self.root() {
            Self::Config(_) | Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
