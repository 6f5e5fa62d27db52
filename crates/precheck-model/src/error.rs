//! Error types for the parameter model

/// Errors raised while decoding model documents
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A JSON document could not be decoded
    #[error("invalid {document} document: {source}")]
    Decode {
        /// Which document failed (knowledge base, catalog, snapshot, ...)
        document: &'static str,
        /// Underlying decoder error
        #[source]
        source: serde_json::Error,
    },

    /// Component kind not recognised
    #[error("unknown component type: {0}")]
    UnknownComponent(String),

    /// Release version string not understood
    #[error("invalid release version: {0}")]
    InvalidVersion(String),
}

impl ModelError {
    /// Create decode error for a named document
    #[inline]
    #[must_use]
    pub fn decode(document: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { document, source }
    }
}
