//! Error taxonomy for decoding and building.
//!
//! Fatal variants abort the file they occurred in and always name the file
//! and the byte offset. Recoverable variants (`DanglingReference`,
//! `UnsupportedEncoding`) are produced at the point of use; builders log them
//! and carry on without the dependent component.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NifError {
    #[error("{file}: malformed header at offset {offset}: {reason}")]
    MalformedHeader {
        file: String,
        offset: u64,
        reason: String,
    },

    #[error("{file}: block {index} has unsupported type `{type_name}` at offset {offset} and no size table to skip it")]
    UnsupportedBlockType {
        file: String,
        offset: u64,
        index: usize,
        type_name: String,
    },

    #[error("{file}: malformed block {index} (`{type_name}`) at offset {offset}: {reason}")]
    MalformedBlock {
        file: String,
        offset: u64,
        index: usize,
        type_name: String,
        reason: String,
    },

    #[error("{file}: unexpected end of stream at offset {offset} ({needed} more bytes needed)")]
    UnexpectedEof { file: String, offset: u64, needed: u64 },

    #[error("{file}: i/o error at offset {offset}")]
    Io {
        file: String,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("dangling reference {reference}: expected {expected}")]
    DanglingReference {
        reference: i32,
        expected: &'static str,
    },

    #[error("unsupported {what} encoding: {value}")]
    UnsupportedEncoding { what: &'static str, value: u32 },

    #[error("resource `{path}` not found in any source")]
    ResourceNotFound { path: String },
}

impl NifError {
    /// Whether the error aborts the whole file.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            NifError::DanglingReference { .. } | NifError::UnsupportedEncoding { .. }
        )
    }

    /// Byte offset of a fatal decoding error.
    pub fn offset(&self) -> Option<u64> {
        match self {
            NifError::MalformedHeader { offset, .. }
            | NifError::UnsupportedBlockType { offset, .. }
            | NifError::MalformedBlock { offset, .. }
            | NifError::UnexpectedEof { offset, .. }
            | NifError::Io { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Re-labels a low level read failure that happened while decoding the
    /// header. Errors that already carry more context pass through.
    pub(crate) fn into_malformed_header(self) -> NifError {
        match self {
            NifError::UnexpectedEof {
                file,
                offset,
                needed,
            } => NifError::MalformedHeader {
                file,
                offset,
                reason: format!("truncated, {needed} more bytes needed"),
            },
            NifError::Io {
                file,
                offset,
                source,
            } => NifError::MalformedHeader {
                file,
                offset,
                reason: source.to_string(),
            },
            other => other,
        }
    }

    /// Attaches the block that was being decoded to a low level read failure.
    pub(crate) fn in_block(self, index: usize, type_name: &str) -> NifError {
        match self {
            NifError::UnexpectedEof {
                file,
                offset,
                needed,
            } => NifError::MalformedBlock {
                file,
                offset,
                index,
                type_name: type_name.to_string(),
                reason: format!("truncated, {needed} more bytes needed"),
            },
            NifError::MalformedBlock {
                file,
                offset,
                reason,
                ..
            } => NifError::MalformedBlock {
                file,
                offset,
                index,
                type_name: type_name.to_string(),
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, NifError>;
