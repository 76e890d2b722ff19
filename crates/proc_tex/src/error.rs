//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, texture shape mismatches, backward frame transitions,
//! encoder failures, compute backend failures, and IO.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid frame transition from frame {current} to frame {requested}")]
    InvalidFrameTransition { current: u64, requested: u64 },

    #[error("encoder failure: {0}")]
    EncoderFailure(String),

    #[error("unknown kernel '{id}'")]
    UnknownKernel { id: String },

    #[error("compute backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Error::ShapeMismatch(msg.into())
    }

    pub(crate) fn encoder(msg: impl Into<String>) -> Self {
        Error::EncoderFailure(msg.into())
    }
}
