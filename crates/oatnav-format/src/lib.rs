//! Navigator for OAT images, the container format for ahead-of-time-compiled
//! Android code.
//!
//! The crate binds a caller-provided byte range (typically a memory map of the
//! `oatdata` section) and resolves dex files, classes, and compiled method
//! entry points inside it. The bytes are treated as untrusted throughout:
//! every dereference is range-checked against the bound region, so corrupt
//! counts and offsets surface as [`OatError`] values instead of bad reads.
//!
//! Structural knowledge of the embedded dex files is delegated to a
//! [`DexFile`] collaborator supplied through [`DexOpener`]; the built-in
//! [`RawDexHeader`] covers metadata-only inspection.
//!
//! ```no_run
//! use oatnav_format::{OatFile, RawDexOpener};
//!
//! # fn demo(bytes: &[u8]) -> Result<(), oatnav_format::OatError> {
//! let oat = OatFile::bind_auto(bytes, RawDexOpener)?;
//! for dex in oat.dex_files() {
//!     let dex = dex?;
//!     println!("{} ({} classes)", dex.location(), dex.class_def_count());
//! }
//! # Ok(())
//! # }
//! ```

mod class;
mod dex;
mod error;
mod header;
mod method;
mod oat_file;
mod region;

#[cfg(test)]
mod fixture;


pub use class::{OatClass, OatClassKind};
pub use dex::{DEX_MAGIC, DexFile, DexOpener, RawDexClass, RawDexHeader, RawDexOpener};
pub use error::{ErrorKind, OatError};
pub use header::{
    InstructionSet, KeyValueIter, OAT_MAGIC, OatHeader, OatVersion, Trampolines, is_valid_header,
};
pub use method::OatMethod;
pub use oat_file::{DexFiles, OatDexFile, OatFile};
pub use region::{Cursor, FileOffset, Region};
