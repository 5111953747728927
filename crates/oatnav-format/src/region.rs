//! Bounds-checked access to the raw OAT byte range.
//!
//! A [`Region`] owns the `[begin, end)` invariant for the whole crate: every
//! offset that is ever dereferenced goes through one of its checked reads,
//! so a corrupt count or offset surfaces as [`OatError::OutOfBounds`] instead
//! of an out-of-range access. [`Cursor`] layers sequential decoding on top.

use crate::error::OatError;

/// Borrowed view of the half-open byte range of a mapped OAT image.
///
/// Owns no memory; the caller's buffer must outlive it. Copying a `Region`
/// copies the borrow, which is how descriptor/class/method handles keep a
/// path back to the root without reference cycles.
#[derive(Clone, Copy, Debug)]
pub struct Region<'a> {
    bytes: &'a [u8],
}

impl<'a> Region<'a> {
    /// Bind a raw byte range. The only requirement here is `end > begin`;
    /// content validation is the job of whatever decodes the bytes next.
    pub fn bind(bytes: &'a [u8]) -> Result<Self, OatError> {
        if bytes.is_empty() {
            return Err(OatError::EmptyRegion);
        }
        Ok(Self { bytes })
    }

    /// Region length in bytes. Always non-zero.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    fn out_of_bounds(&self, offset: usize, len: usize) -> OatError {
        OatError::OutOfBounds {
            offset,
            len,
            region_len: self.bytes.len(),
        }
    }

    /// `len` bytes starting at `offset`, or `OutOfBounds`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], OatError> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| self.out_of_bounds(offset, len))?;
        self.bytes
            .get(offset..end)
            .ok_or_else(|| self.out_of_bounds(offset, len))
    }

    /// Everything from `offset` to the region end. `offset` must lie strictly
    /// inside the region.
    pub fn tail(&self, offset: usize) -> Result<&'a [u8], OatError> {
        if offset >= self.bytes.len() {
            return Err(self.out_of_bounds(offset, 1));
        }
        Ok(&self.bytes[offset..])
    }

    /// Read a little-endian u32 at `offset`.
    pub fn read_u32(&self, offset: usize) -> Result<u32, OatError> {
        let b = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian u16 at `offset`.
    pub fn read_u16(&self, offset: usize) -> Result<u16, OatError> {
        let b = self.slice(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian i16 at `offset`.
    pub fn read_i16(&self, offset: usize) -> Result<i16, OatError> {
        Ok(self.read_u16(offset)? as i16)
    }

    /// Absolute address of the byte at `offset` within the mapped range.
    pub fn address_of(&self, offset: usize) -> Result<*const u8, OatError> {
        if offset >= self.bytes.len() {
            return Err(self.out_of_bounds(offset, 1));
        }
        Ok(self.bytes[offset..].as_ptr())
    }
}

/// A file-relative offset as stored in the image.
///
/// Zero is reserved to mean "absent": offset 0 is the header itself and can
/// never be a legitimate target.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(transparent)]
pub struct FileOffset(pub u32);

impl FileOffset {
    pub const ABSENT: Self = Self(0);

    #[inline]
    pub fn is_absent(self) -> bool {
        self.0 == 0
    }

    /// Translate to an in-region byte offset; `None` for the absent sentinel.
    /// Whether the offset actually lands inside the region is checked by the
    /// read that follows, not here.
    #[inline]
    pub fn get(self) -> Option<usize> {
        if self.0 == 0 { None } else { Some(self.0 as usize) }
    }
}

/// Sequential reader over a region.
///
/// Every read is checked against the region end before any bytes are
/// consumed; a failed read returns `OutOfBounds` and does not advance, so a
/// caller that aborts on error observes no partial state.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    region: Region<'a>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(region: Region<'a>, pos: usize) -> Self {
        Self { region, pos }
    }

    /// Current offset from the region start.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Consume `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], OatError> {
        let bytes = self.region.slice(self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }

    /// Consume a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OatError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Consume a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, OatError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Consume a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, OatError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Consume a little-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, OatError> {
        Ok(self.read_u32()? as i32)
    }

    /// Consume a little-endian i16.
    pub fn read_i16(&mut self) -> Result<i16, OatError> {
        Ok(self.read_u16()? as i16)
    }
}
