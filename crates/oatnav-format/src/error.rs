//! Error type for OAT navigation.

use thiserror::Error;

/// Coarse classification of an [`OatError`].
///
/// Multi-candidate scans branch on this: a `NotFound` from one candidate is
/// recoverable and the scan continues, while `OutOfBounds` means the byte
/// stream is corrupt from that point on and the whole scan must abort.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// The caller handed us something unusable (empty region, unknown
    /// layout version).
    InvalidArgument,
    /// A read would cross the end of the region, or a record is structurally
    /// unreadable. Everything after the failing record is untrustworthy.
    OutOfBounds,
    /// A well-formed lookup whose target simply is not present.
    NotFound,
    /// A structurally valid "no value": the method exists but was not
    /// ahead-of-time compiled. Not a failure of the lookup itself.
    AbsentValue,
}

/// Errors produced while navigating an OAT region.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OatError {
    #[error("empty region")]
    EmptyRegion,
    #[error("unknown oat version {version:?}")]
    UnknownVersion { version: [u8; 4] },
    #[error("unknown instruction set {raw}")]
    UnknownInstructionSet { raw: u32 },

    #[error("read of {len} bytes at offset {offset} crosses region end ({region_len} bytes)")]
    OutOfBounds {
        offset: usize,
        len: usize,
        region_len: usize,
    },
    #[error("dex file #{index}: payload offset is the absent sentinel")]
    AbsentPayload { index: u32 },
    #[error("embedded dex header truncated ({have} bytes)")]
    TruncatedDexHeader { have: usize },
    #[error("embedded dex header has bad magic")]
    BadDexMagic,
    #[error("oat class record at offset {offset}: unknown kind {kind}")]
    BadClassKind { offset: usize, kind: u16 },
    #[error("class-def index {class_def_index}: oat class record offset is the absent sentinel")]
    AbsentClassRecord { class_def_index: u32 },

    #[error("no dex file with location {location:?}")]
    DexNotFound { location: String },
    #[error("dex file index {index} out of range ({count} present)")]
    DexIndexOutOfRange { index: u32, count: u32 },
    #[error("class {descriptor:?} not found")]
    ClassNotFound { descriptor: String },
    #[error("class-def index {class_def_index} not found")]
    ClassIndexNotFound { class_def_index: u32 },
    #[error("method {name:?} {signature:?} not found")]
    MethodNotFound { name: String, signature: String },

    #[error("method has no compiled code")]
    NoCompiledCode,
}

impl OatError {
    /// The four-way classification scans dispatch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyRegion | Self::UnknownVersion { .. } | Self::UnknownInstructionSet { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::OutOfBounds { .. }
            | Self::AbsentPayload { .. }
            | Self::TruncatedDexHeader { .. }
            | Self::BadDexMagic
            | Self::BadClassKind { .. }
            | Self::AbsentClassRecord { .. } => ErrorKind::OutOfBounds,
            Self::DexNotFound { .. }
            | Self::DexIndexOutOfRange { .. }
            | Self::ClassNotFound { .. }
            | Self::ClassIndexNotFound { .. }
            | Self::MethodNotFound { .. } => ErrorKind::NotFound,
            Self::NoCompiledCode => ErrorKind::AbsentValue,
        }
    }
}
