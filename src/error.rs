//! The error type of the crate.
//!
//! The graph model and the engines computing over it never fail, errors only come from loading
//! instances and moving snapshots in and out of files.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing section marker `{marker}`")]
    MissingSection { marker: &'static str },

    #[error("section marker `{marker}` on line {line} is out of order")]
    SectionOrder { marker: &'static str, line: usize },

    #[error("invalid value `{value}` for header `{key}`")]
    Header { key: &'static str, value: String },

    #[error("malformed row on line {line} of section `{section}`: {message}")]
    Row {
        line: usize,
        section: &'static str,
        message: String,
    },

    #[error("cannot serialise non-finite value {value} of `{field}`")]
    NonFinite { field: &'static str, value: f64 },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
