//! OAT-side class records.
//!
//! A class record lives at the file offset stored in its descriptor's
//! class-def offset table: `status: i16`, `kind: u16`, an optional
//! compiled-methods bitmap, then the method-offsets table. The table's length
//! is not stored anywhere, so entry reads are bounds-checked at access time.

use crate::error::OatError;
use crate::header::OatVersion;
use crate::region::{Cursor, FileOffset, Region};

/// How the class's methods were ahead-of-time compiled. Selects the shape of
/// the method-offsets table that follows the record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OatClassKind {
    /// Every method has a table entry, indexed directly by method index.
    AllCompiled,
    /// A bitmap marks compiled methods; the table holds entries for set bits
    /// only, in method-index order.
    SomeCompiled,
    /// No table at all; every method is interpreter-only.
    NoneCompiled,
}

impl OatClassKind {
    fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::AllCompiled),
            1 => Some(Self::SomeCompiled),
            2 => Some(Self::NoneCompiled),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AllCompiled => "all-compiled",
            Self::SomeCompiled => "some-compiled",
            Self::NoneCompiled => "none-compiled",
        }
    }
}

/// A class resolved inside one descriptor: the structural handle from the
/// dex collaborator plus the decoded OAT-side record.
///
/// `C` is the collaborator's class handle type. The handle does not borrow
/// its descriptor; it carries the region view and the keys needed to stand
/// alone (class-def index, layout version).
#[derive(Debug)]
pub struct OatClass<'a, C> {
    region: Region<'a>,
    version: OatVersion,
    class_def_index: u32,
    structural: C,
    status: i16,
    kind: OatClassKind,
    /// Compiled-methods bitmap; empty unless `kind` is `SomeCompiled`.
    bitmap: &'a [u8],
    /// Region offset of the method-offsets table; `None` for `NoneCompiled`.
    methods_offset: Option<usize>,
}

impl<'a, C> OatClass<'a, C> {
    /// Decode the record at `offset`. Every field read is checked against
    /// the region end; an unknown kind is treated as corruption.
    pub(crate) fn decode(
        region: Region<'a>,
        version: OatVersion,
        offset: usize,
        class_def_index: u32,
        structural: C,
    ) -> Result<Self, OatError> {
        let mut cur = Cursor::new(region, offset);
        let status = cur.read_i16()?;
        let kind_raw = cur.read_u16()?;
        let kind = OatClassKind::from_raw(kind_raw).ok_or(OatError::BadClassKind {
            offset,
            kind: kind_raw,
        })?;

        let (bitmap, methods_offset) = match kind {
            OatClassKind::AllCompiled => (&[][..], Some(cur.pos())),
            OatClassKind::SomeCompiled => {
                let bitmap_len = cur.read_u32()? as usize;
                let bitmap = cur.read_bytes(bitmap_len)?;
                (bitmap, Some(cur.pos()))
            }
            OatClassKind::NoneCompiled => (&[][..], None),
        };

        Ok(Self {
            region,
            version,
            class_def_index,
            structural,
            status,
            kind,
            bitmap,
            methods_offset,
        })
    }

    /// Raw class status (mirror of the runtime's class-state value).
    pub fn status(&self) -> i16 {
        self.status
    }

    pub fn kind(&self) -> OatClassKind {
        self.kind
    }

    pub fn class_def_index(&self) -> u32 {
        self.class_def_index
    }

    /// The collaborator's class handle.
    pub fn structural(&self) -> &C {
        &self.structural
    }

    /// Compiled-methods bitmap (`SomeCompiled` only; empty otherwise).
    pub fn bitmap(&self) -> &'a [u8] {
        self.bitmap
    }

    /// Whether method `method_index` has a method-offsets table entry.
    pub fn is_method_compiled(&self, method_index: u32) -> bool {
        match self.kind {
            OatClassKind::AllCompiled => true,
            OatClassKind::NoneCompiled => false,
            OatClassKind::SomeCompiled => {
                let byte = (method_index / 8) as usize;
                let bit = 1u8 << (method_index % 8);
                self.bitmap.get(byte).is_some_and(|b| b & bit != 0)
            }
        }
    }

    /// Table position of method `method_index`: the number of compiled
    /// methods before it. Caller has checked the method's own bit.
    fn compiled_index(&self, method_index: u32) -> usize {
        let i = method_index as usize;
        let full = i / 8;
        let mut n: usize = self.bitmap[..full]
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum();
        if i % 8 != 0 {
            let mask = (1u8 << (i % 8)) - 1;
            n += (self.bitmap[full] & mask).count_ones() as usize;
        }
        n
    }

    /// File offset of the compiled code for method `method_index`.
    ///
    /// Returns the absent sentinel when the method has no table entry
    /// (`NoneCompiled` class, cleared bitmap bit) or when the entry itself
    /// holds the sentinel value — all of which mean "interpreter-only", not
    /// an error. An entry read that crosses the region end is an error.
    pub fn method_code_offset(&self, method_index: u32) -> Result<FileOffset, OatError> {
        let Some(base) = self.methods_offset else {
            return Ok(FileOffset::ABSENT);
        };
        let table_index = match self.kind {
            OatClassKind::NoneCompiled => return Ok(FileOffset::ABSENT),
            OatClassKind::AllCompiled => method_index as usize,
            OatClassKind::SomeCompiled => {
                if !self.is_method_compiled(method_index) {
                    return Ok(FileOffset::ABSENT);
                }
                self.compiled_index(method_index)
            }
        };
        let entry = base + table_index * self.version.method_offsets_stride();
        Ok(FileOffset(self.region.read_u32(entry)?))
    }

    pub(crate) fn region(&self) -> Region<'a> {
        self.region
    }
}
