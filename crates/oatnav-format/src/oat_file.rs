//! The bound OAT file and its descriptor stream.
//!
//! Per-dex-file descriptors are variable-length and self-describing (their
//! size depends on the location-string length and the embedded dex file's
//! class-def count), so there is no random-access index: reaching descriptor
//! `i` means decoding descriptors `0..=i` from the stream start. A decode
//! failure desynchronizes the stream — every later offset is untrustworthy —
//! so scans abort on the first one instead of skipping ahead.

use std::borrow::Cow;

use crate::class::OatClass;
use crate::dex::{DexFile, DexOpener};
use crate::error::{ErrorKind, OatError};
use crate::header::{KeyValueIter, OatHeader, OatVersion};
use crate::method::OatMethod;
use crate::region::{Cursor, FileOffset, Region};

/// A raw region bound to a typed OAT view.
///
/// Binding is O(1) structural setup: the fixed header is read (each field
/// access is range-checked) and the key/value block and descriptor stream
/// starts are computed. Content validation is lazy — corrupt counts surface
/// as `OutOfBounds` when the stream decoder runs into them.
#[derive(Debug)]
pub struct OatFile<'a, O: DexOpener> {
    region: Region<'a>,
    version: OatVersion,
    header: OatHeader,
    opener: O,
    key_value_offset: usize,
    dex_files_offset: usize,
}

impl<'a, O: DexOpener> OatFile<'a, O> {
    /// Bind `bytes` as an OAT region with an explicit layout version.
    ///
    /// Does not validate magic or version content; callers that want a
    /// pre-check use [`is_valid_header`](crate::is_valid_header).
    pub fn bind(bytes: &'a [u8], version: OatVersion, opener: O) -> Result<Self, OatError> {
        let region = Region::bind(bytes)?;
        let header = OatHeader::parse(region, version)?;
        let key_value_offset = version.header_size();
        let dex_files_offset = key_value_offset + header.key_value_store_size as usize;
        Ok(Self {
            region,
            version,
            header,
            opener,
            key_value_offset,
            dex_files_offset,
        })
    }

    /// Bind, taking the layout version from the header's own version string.
    pub fn bind_auto(bytes: &'a [u8], opener: O) -> Result<Self, OatError> {
        let version = OatVersion::from_header_bytes(bytes).ok_or_else(|| {
            let mut found = [0u8; 4];
            for (dst, src) in found.iter_mut().zip(bytes.get(4..8).unwrap_or(&[])) {
                *dst = *src;
            }
            OatError::UnknownVersion { version: found }
        })?;
        Self::bind(bytes, version, opener)
    }

    pub fn header(&self) -> &OatHeader {
        &self.header
    }

    pub fn version(&self) -> OatVersion {
        self.version
    }

    /// The bound region view.
    pub fn region(&self) -> Region<'a> {
        self.region
    }

    /// Declared number of embedded dex files. Untrusted until the stream
    /// decodes that far.
    pub fn dex_file_count(&self) -> u32 {
        self.header.dex_file_count
    }

    /// Offset of the first descriptor in the stream.
    pub fn dex_files_offset(&self) -> usize {
        self.dex_files_offset
    }

    /// Key/value metadata pairs from the block between the fixed header and
    /// the descriptor stream. Fails if the declared block size crosses the
    /// region end.
    pub fn key_values(&self) -> Result<KeyValueIter<'a>, OatError> {
        let block = self
            .region
            .slice(self.key_value_offset, self.header.key_value_store_size as usize)?;
        Ok(KeyValueIter::new(block))
    }

    /// Decode one descriptor at the cursor, leaving the cursor past it.
    fn decode_dex_file(
        &self,
        cur: &mut Cursor<'a>,
        index: u32,
    ) -> Result<OatDexFile<'a, O::Dex>, OatError> {
        let location_len = cur.read_u32()? as usize;
        let location = cur.read_bytes(location_len)?;
        let checksum = cur.read_u32()?;
        let payload = FileOffset(cur.read_u32()?);
        let payload_offset = payload.get().ok_or(OatError::AbsentPayload { index })?;
        let dex = self.opener.open(self.region.tail(payload_offset)?)?;
        let class_def_count = dex.class_def_count();
        let class_offsets = cur.read_bytes((class_def_count as usize).saturating_mul(4))?;

        Ok(OatDexFile {
            region: self.region,
            version: self.version,
            instruction_set: self.header.instruction_set,
            index,
            location,
            checksum,
            payload_offset,
            class_def_count,
            class_offsets,
            dex,
        })
    }

    /// Streaming iterator over the descriptor stream. Yields a decode error
    /// at the failing position and then stops; it never skips past a bad
    /// record to later (untrustworthy) ones.
    pub fn dex_files(&self) -> DexFiles<'_, 'a, O> {
        DexFiles {
            oat: self,
            cursor: Cursor::new(self.region, self.dex_files_offset),
            next_index: 0,
            poisoned: false,
        }
    }

    /// Decode the `index`-th descriptor by decoding `0..=index` from the
    /// stream start. Cost is O(index); nothing is cached between calls.
    pub fn dex_file_by_index(&self, index: u32) -> Result<OatDexFile<'a, O::Dex>, OatError> {
        let count = self.header.dex_file_count;
        if index >= count {
            return Err(OatError::DexIndexOutOfRange { index, count });
        }
        let mut cur = Cursor::new(self.region, self.dex_files_offset);
        for i in 0..index {
            self.decode_dex_file(&mut cur, i)?;
        }
        self.decode_dex_file(&mut cur, index)
    }

    /// Decode descriptors until one whose location matches `location`
    /// byte-for-byte (the stored string is length-prefixed, so this is not a
    /// C-string compare). A decode failure aborts the scan; exhausting the
    /// stream without a match is `DexNotFound`.
    pub fn dex_file_by_location(&self, location: &str) -> Result<OatDexFile<'a, O::Dex>, OatError> {
        let mut cur = Cursor::new(self.region, self.dex_files_offset);
        for i in 0..self.header.dex_file_count {
            let dex_file = self.decode_dex_file(&mut cur, i)?;
            if dex_file.location == location.as_bytes() {
                return Ok(dex_file);
            }
        }
        Err(OatError::DexNotFound {
            location: location.to_string(),
        })
    }

    /// Probe every descriptor for a class named `descriptor`; first hit
    /// wins. A `NotFound` from one dex file keeps the scan going; a decode
    /// failure aborts it.
    #[allow(clippy::type_complexity)]
    pub fn find_class(
        &self,
        descriptor: &str,
    ) -> Result<(OatDexFile<'a, O::Dex>, OatClass<'a, <O::Dex as DexFile>::Class>), OatError> {
        let mut cur = Cursor::new(self.region, self.dex_files_offset);
        for i in 0..self.header.dex_file_count {
            let dex_file = self.decode_dex_file(&mut cur, i)?;
            match dex_file.find_class(descriptor) {
                Ok(class) => return Ok((dex_file, class)),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Err(OatError::ClassNotFound {
            descriptor: descriptor.to_string(),
        })
    }
}

/// Iterator produced by [`OatFile::dex_files`].
pub struct DexFiles<'f, 'a, O: DexOpener> {
    oat: &'f OatFile<'a, O>,
    cursor: Cursor<'a>,
    next_index: u32,
    poisoned: bool,
}

impl<'f, 'a, O: DexOpener> Iterator for DexFiles<'f, 'a, O> {
    type Item = Result<OatDexFile<'a, O::Dex>, OatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned || self.next_index >= self.oat.header.dex_file_count {
            return None;
        }
        let result = self.oat.decode_dex_file(&mut self.cursor, self.next_index);
        match &result {
            Ok(_) => self.next_index += 1,
            Err(_) => self.poisoned = true,
        }
        Some(result)
    }
}

/// One decoded per-dex-file descriptor.
///
/// `D` is the collaborator's structural view of the embedded dex payload.
#[derive(Debug)]
pub struct OatDexFile<'a, D: DexFile> {
    region: Region<'a>,
    version: OatVersion,
    instruction_set: u32,
    index: u32,
    location: &'a [u8],
    checksum: u32,
    payload_offset: usize,
    class_def_count: u32,
    /// Class-def offset table: one little-endian u32 file offset per class.
    class_offsets: &'a [u8],
    dex: D,
}

impl<'a, D: DexFile> OatDexFile<'a, D> {
    /// Position within the descriptor stream.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Raw location bytes. Length-prefixed in the image — may legitimately
    /// contain bytes that would terminate a C string.
    pub fn location_bytes(&self) -> &'a [u8] {
        self.location
    }

    /// Location as UTF-8, lossily.
    pub fn location(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.location)
    }

    /// Declared checksum of the embedded dex file. Not validated here.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// File offset of the embedded dex payload.
    pub fn payload_offset(&self) -> usize {
        self.payload_offset
    }

    pub fn class_def_count(&self) -> u32 {
        self.class_def_count
    }

    /// The collaborator's structural view.
    pub fn dex(&self) -> &D {
        &self.dex
    }

    /// Entry of the class-def offset table. The absent sentinel is passed
    /// through; interpreting it is the caller's concern.
    pub fn class_record_offset(&self, class_def_index: u32) -> Result<FileOffset, OatError> {
        if class_def_index >= self.class_def_count {
            return Err(OatError::ClassIndexNotFound { class_def_index });
        }
        let at = class_def_index as usize * 4;
        let b = &self.class_offsets[at..at + 4];
        Ok(FileOffset(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
    }

    fn decode_class(
        &self,
        structural: D::Class,
        class_def_index: u32,
    ) -> Result<OatClass<'a, D::Class>, OatError> {
        let offset = self
            .class_record_offset(class_def_index)?
            .get()
            .ok_or(OatError::AbsentClassRecord { class_def_index })?;
        OatClass::decode(self.region, self.version, offset, class_def_index, structural)
    }

    /// Resolve a class by descriptor string, then decode its OAT record.
    ///
    /// "Class not found" and "record failed to decode" stay distinct: the
    /// former is recoverable for callers scanning several dex files, the
    /// latter means this region is corrupt.
    pub fn find_class(&self, descriptor: &str) -> Result<OatClass<'a, D::Class>, OatError> {
        let structural =
            self.dex
                .find_class(descriptor)
                .ok_or_else(|| OatError::ClassNotFound {
                    descriptor: descriptor.to_string(),
                })?;
        let class_def_index = self.dex.class_def_index(&structural);
        self.decode_class(structural, class_def_index)
    }

    /// Resolve a class by class-def index, then decode its OAT record.
    pub fn class_by_index(&self, class_def_index: u32) -> Result<OatClass<'a, D::Class>, OatError> {
        let structural = self
            .dex
            .class_by_index(class_def_index)
            .ok_or(OatError::ClassIndexNotFound { class_def_index })?;
        self.decode_class(structural, class_def_index)
    }

    fn method_from_structural(
        &self,
        class: &OatClass<'a, D::Class>,
        structural: D::Method,
    ) -> Result<OatMethod<'a, D::Method>, OatError> {
        let method_index = self.dex.method_index(&structural);
        let code_offset = class.method_code_offset(method_index)?;
        Ok(OatMethod::new(
            class.region(),
            self.instruction_set,
            structural,
            code_offset,
        ))
    }

    /// Resolve a direct method by name and signature.
    ///
    /// A missing method-offsets entry is not a failure; the returned handle
    /// just reports no native code.
    pub fn find_direct_method(
        &self,
        class: &OatClass<'a, D::Class>,
        name: &str,
        signature: &str,
    ) -> Result<OatMethod<'a, D::Method>, OatError> {
        let structural = self
            .dex
            .find_direct_method(class.structural(), name, signature)
            .ok_or_else(|| OatError::MethodNotFound {
                name: name.to_string(),
                signature: signature.to_string(),
            })?;
        self.method_from_structural(class, structural)
    }

    /// Resolve a virtual method by name and signature.
    pub fn find_virtual_method(
        &self,
        class: &OatClass<'a, D::Class>,
        name: &str,
        signature: &str,
    ) -> Result<OatMethod<'a, D::Method>, OatError> {
        let structural = self
            .dex
            .find_virtual_method(class.structural(), name, signature)
            .ok_or_else(|| OatError::MethodNotFound {
                name: name.to_string(),
                signature: signature.to_string(),
            })?;
        self.method_from_structural(class, structural)
    }

    /// Resolve a method trying direct first, then virtual. Fails only when
    /// both lookups miss structurally; compiled status is irrelevant here.
    pub fn find_method(
        &self,
        class: &OatClass<'a, D::Class>,
        name: &str,
        signature: &str,
    ) -> Result<OatMethod<'a, D::Method>, OatError> {
        match self.find_direct_method(class, name, signature) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.find_virtual_method(class, name, signature)
            }
            other => other,
        }
    }
}
