//! Interface to the embedded dex structural format.
//!
//! The navigator never walks class-def or method tables itself; it delegates
//! to a [`DexFile`] implementation supplied by the caller. The one piece of
//! dex layout known in this crate is the minimal header peek in
//! [`RawDexHeader`], which is enough to size a descriptor's class-def offset
//! table and to inspect images without a full dex parser.

use std::convert::Infallible;

use crate::error::OatError;

/// Magic bytes of an embedded dex payload.
pub const DEX_MAGIC: [u8; 4] = *b"dex\n";

const DEX_CHECKSUM_OFFSET: usize = 8;
const DEX_FILE_SIZE_OFFSET: usize = 32;
const DEX_CLASS_DEFS_SIZE_OFFSET: usize = 96;
const DEX_HEADER_SIZE: usize = 112;

/// Structural view of one embedded dex payload.
///
/// Implementations are assumed bounds-safe over their own payload. Lookups
/// return `None` for absent targets; the navigator turns those into its
/// not-found errors.
pub trait DexFile {
    /// Resolved class handle.
    type Class;
    /// Resolved method handle.
    type Method;

    /// Number of class definitions. This sizes the descriptor's class-def
    /// offset table, so it must be available even from a metadata-only view.
    fn class_def_count(&self) -> u32;

    /// Look up a class by descriptor string, e.g. `"Lcom/example/Foo;"`.
    fn find_class(&self, descriptor: &str) -> Option<Self::Class>;

    /// Look up a class by class-def index.
    fn class_by_index(&self, class_def_index: u32) -> Option<Self::Class>;

    /// Class-def index of a resolved class.
    fn class_def_index(&self, class: &Self::Class) -> u32;

    fn find_direct_method(
        &self,
        class: &Self::Class,
        name: &str,
        signature: &str,
    ) -> Option<Self::Method>;

    fn find_virtual_method(
        &self,
        class: &Self::Class,
        name: &str,
        signature: &str,
    ) -> Option<Self::Method>;

    /// Position of the method within its class, which is also its index into
    /// the OAT-side method-offsets table.
    fn method_index(&self, method: &Self::Method) -> u32;
}

/// Opens structural views over embedded dex payloads.
///
/// `payload` runs from the descriptor's payload offset to the end of the OAT
/// region; the dex format is self-sizing, so the opener trims it.
pub trait DexOpener {
    type Dex: DexFile;

    fn open(&self, payload: &[u8]) -> Result<Self::Dex, OatError>;
}

impl<O: DexOpener> DexOpener for &O {
    type Dex = O::Dex;

    fn open(&self, payload: &[u8]) -> Result<Self::Dex, OatError> {
        (**self).open(payload)
    }
}

/// Metadata-only view of an embedded dex payload.
///
/// Reads the fixed dex header and answers [`class_def_count`]; classes can be
/// resolved by index (the count is known) but never by name, and methods not
/// at all. Enough for descriptor decoding and image inspection.
///
/// [`class_def_count`]: DexFile::class_def_count
#[derive(Clone, Copy, Debug)]
pub struct RawDexHeader {
    pub checksum: u32,
    pub file_size: u32,
    pub class_defs_size: u32,
}

impl RawDexHeader {
    pub fn parse(payload: &[u8]) -> Result<Self, OatError> {
        if payload.len() < DEX_HEADER_SIZE {
            return Err(OatError::TruncatedDexHeader { have: payload.len() });
        }
        if payload[..4] != DEX_MAGIC {
            return Err(OatError::BadDexMagic);
        }
        let read = |off: usize| {
            u32::from_le_bytes([
                payload[off],
                payload[off + 1],
                payload[off + 2],
                payload[off + 3],
            ])
        };
        Ok(Self {
            checksum: read(DEX_CHECKSUM_OFFSET),
            file_size: read(DEX_FILE_SIZE_OFFSET),
            class_defs_size: read(DEX_CLASS_DEFS_SIZE_OFFSET),
        })
    }
}

/// Class handle produced by [`RawDexHeader`]: just the class-def index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RawDexClass {
    pub class_def_index: u32,
}

impl DexFile for RawDexHeader {
    type Class = RawDexClass;
    type Method = Infallible;

    fn class_def_count(&self) -> u32 {
        self.class_defs_size
    }

    fn find_class(&self, _descriptor: &str) -> Option<RawDexClass> {
        None
    }

    fn class_by_index(&self, class_def_index: u32) -> Option<RawDexClass> {
        (class_def_index < self.class_defs_size).then_some(RawDexClass { class_def_index })
    }

    fn class_def_index(&self, class: &RawDexClass) -> u32 {
        class.class_def_index
    }

    fn find_direct_method(&self, _: &RawDexClass, _: &str, _: &str) -> Option<Infallible> {
        None
    }

    fn find_virtual_method(&self, _: &RawDexClass, _: &str, _: &str) -> Option<Infallible> {
        None
    }

    fn method_index(&self, method: &Infallible) -> u32 {
        match *method {}
    }
}

/// Opener for [`RawDexHeader`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RawDexOpener;

impl DexOpener for RawDexOpener {
    type Dex = RawDexHeader;

    fn open(&self, payload: &[u8]) -> Result<RawDexHeader, OatError> {
        RawDexHeader::parse(payload)
    }
}
