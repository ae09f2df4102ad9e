//! Error types for control-plane access
//!
//! Two families of failure surface from the platform layer:
//! - Transport failures (the request never produced a usable answer)
//! - Decode failures (an answer arrived but did not have the expected shape)

/// Platform access error
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Request could not be issued or completed
    #[error("request to {path} failed: {message}")]
    Transport {
        /// Request path
        path: String,
        /// Underlying failure
        message: String,
    },

    /// Control plane answered with a non-success HTTP status
    #[error("request to {path} returned status {status}: {body}")]
    Status {
        /// Request path
        path: String,
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// Control plane answered with an error envelope
    #[error("request to {path} was rejected ({error_code}): {description}")]
    Api {
        /// Request path
        path: String,
        /// Platform error code, e.g. `CF-AppNotFound`
        error_code: String,
        /// Human-readable description
        description: String,
    },

    /// Response body did not match the expected shape
    #[error("malformed response from {path}: {source}")]
    Decode {
        /// Request path
        path: String,
        /// JSON decoding failure
        #[source]
        source: serde_json::Error,
    },
}

impl PlatformError {
    /// Create a transport error
    #[inline]
    pub fn transport(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error
    #[inline]
    pub fn decode(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    /// Check if this error belongs to the transport family
    ///
    /// Status and API rejections count as transport failures: the call did
    /// not succeed, but the body itself was well formed.
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Api { .. }
        )
    }

    /// Check if this error is a decode failure
    #[inline]
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Path of the request that failed
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Transport { path, .. }
            | Self::Status { path, .. }
            | Self::Api { path, .. }
            | Self::Decode { path, .. } => path,
        }
    }
}
