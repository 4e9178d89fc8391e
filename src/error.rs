// src/error.rs
//! Error handling for the physics core.
//!
//! - **Construction errors** fail fast at the call site: bad shape specs, bad body
//!   parameters, re-initializing a populated world.
//! - **No-ops** (removing an untracked object, adding a missing body) are never errors.
//! - `step()` never returns an error at all.

use thiserror::Error;

/// Main error type. Send + Sync + 'static.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// `initialize` was called while bodies are still registered.
    #[error("physics world already initialized with {bodies} registered bodies")]
    AlreadyInitialized { bodies: usize },

    /// An operation that needs the simulation ran before `initialize`.
    #[error("physics world is not initialized")]
    NotInitialized,

    /// Both a sphere radius and box extents were supplied.
    #[error("ambiguous shape: both a sphere radius and box extents were supplied")]
    AmbiguousShape,

    /// Neither a sphere radius nor box extents were supplied.
    #[error("missing shape: neither a sphere radius nor box extents were supplied")]
    MissingShape,

    /// Shape dimensions that cannot be simulated (negative radius, zero extent, ...).
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A body or config parameter outside its valid range.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// I/O errors while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rich context chaining.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    #[inline]
    pub fn invalid_shape<S: Into<String>>(msg: S) -> Self {
        Self::InvalidShape(msg.into())
    }

    /// Add context to any error (chainable, like `.context()` in anyhow).
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Errors raised synchronously while building or registering an object.
    pub fn is_construction(&self) -> bool {
        match self {
            Error::AlreadyInitialized { .. }
            | Error::AmbiguousShape
            | Error::MissingShape
            | Error::InvalidShape(_)
            | Error::InvalidParameter { .. } => true,
            Error::WithContext { source, .. } => source.is_construction(),
            _ => false,
        }
    }

    /// Errors raised while reading or parsing configuration.
    pub fn is_config(&self) -> bool {
        match self {
            Error::Io(_) | Error::Json(_) => true,
            Error::WithContext { source, .. } => source.is_config(),
            _ => false,
        }
    }
}

/// Convenient `Result` alias, use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, Error>;
