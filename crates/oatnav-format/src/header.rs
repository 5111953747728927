//! OAT header: version-dependent fixed fields plus the key/value block.
//!
//! The fixed header starts at region offset 0 and ends at the flexible
//! key/value array. Two on-disk layouts are supported; the differences are a
//! set of portable-ABI trampoline fields (045 only) and the stride of the
//! per-method offsets entries (see [`OatVersion::method_offsets_stride`]).

use crate::error::OatError;
use crate::region::{Cursor, FileOffset, Region};

/// Magic bytes identifying an OAT image.
pub const OAT_MAGIC: [u8; 4] = *b"oat\n";

/// Supported on-disk layout versions.
///
/// Layout selection is a configuration input: [`crate::OatFile::bind`] takes
/// the version explicitly, and [`OatVersion::from_header_bytes`] sniffs the
/// header's own version string for callers that trust it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OatVersion {
    /// Android 5.x images.
    V045,
    /// Android 6.0 images.
    V064,
}

impl OatVersion {
    /// The on-disk version string for this layout.
    pub fn version_bytes(self) -> [u8; 4] {
        match self {
            Self::V045 => *b"045\0",
            Self::V064 => *b"064\0",
        }
    }

    /// Sniff the layout version from the header's version field.
    pub fn from_header_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes.get(4..8)? {
            b"045\0" => Some(Self::V045),
            b"064\0" => Some(Self::V064),
            _ => None,
        }
    }

    /// Byte size of the fixed header, up to the flexible key/value array.
    pub fn header_size(self) -> usize {
        match self {
            Self::V045 => 84,
            Self::V064 => 72,
        }
    }

    /// Byte stride of one method-offsets table entry. The 045 layout keeps a
    /// GC-map offset next to the code offset; 064 dropped it.
    pub fn method_offsets_stride(self) -> usize {
        match self {
            Self::V045 => 8,
            Self::V064 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::V045 => "045",
            Self::V064 => "064",
        }
    }
}

/// Instruction set the image was compiled for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstructionSet {
    None,
    Arm,
    Arm64,
    Thumb2,
    X86,
    X86_64,
    Mips,
    Mips64,
}

impl InstructionSet {
    /// Decode the header's instruction-set field.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Arm),
            2 => Some(Self::Arm64),
            3 => Some(Self::Thumb2),
            4 => Some(Self::X86),
            5 => Some(Self::X86_64),
            6 => Some(Self::Mips),
            7 => Some(Self::Mips64),
            _ => None,
        }
    }

    /// Strip the instruction-set-selection encoding from an entry address.
    /// ARM entry points carry the Thumb bit in bit 0.
    pub fn entry_point_to_code_pointer(self, addr: usize) -> usize {
        match self {
            Self::Arm | Self::Thumb2 => addr & !1,
            _ => addr,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Thumb2 => "thumb2",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Mips => "mips",
            Self::Mips64 => "mips64",
        }
    }
}

/// Trampoline entry offsets. The portable set only exists in the 045 layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trampolines {
    pub interpreter_to_interpreter_bridge: FileOffset,
    pub interpreter_to_compiled_code_bridge: FileOffset,
    pub jni_dlsym_lookup: FileOffset,
    pub portable_imt_conflict: Option<FileOffset>,
    pub portable_resolution: Option<FileOffset>,
    pub portable_to_interpreter_bridge: Option<FileOffset>,
    pub quick_generic_jni: FileOffset,
    pub quick_imt_conflict: FileOffset,
    pub quick_resolution: FileOffset,
    pub quick_to_interpreter_bridge: FileOffset,
}

/// Parsed fixed-header fields.
///
/// Parsing range-checks each read but deliberately does not validate the
/// magic or version content; [`is_valid_header`] exists for callers who want
/// to pre-check a candidate region before binding.
#[derive(Clone, Debug)]
pub struct OatHeader {
    pub magic: [u8; 4],
    pub version: [u8; 4],
    /// Adler32 of the rest of the file. Not validated by the navigator.
    pub checksum: u32,
    pub instruction_set: u32,
    pub instruction_set_features: u32,
    pub dex_file_count: u32,
    pub executable_offset: u32,
    pub trampolines: Trampolines,
    pub image_patch_delta: i32,
    pub image_file_location_oat_checksum: u32,
    pub image_file_location_oat_data_begin: u32,
    pub key_value_store_size: u32,
}

impl OatHeader {
    pub(crate) fn parse(region: Region<'_>, version: OatVersion) -> Result<Self, OatError> {
        let mut cur = Cursor::new(region, 0);
        let magic = cur.read_array()?;
        let version_bytes = cur.read_array()?;
        let checksum = cur.read_u32()?;
        let instruction_set = cur.read_u32()?;
        let instruction_set_features = cur.read_u32()?;
        let dex_file_count = cur.read_u32()?;
        let executable_offset = cur.read_u32()?;

        let mut off = || -> Result<FileOffset, OatError> { Ok(FileOffset(cur.read_u32()?)) };
        let interpreter_to_interpreter_bridge = off()?;
        let interpreter_to_compiled_code_bridge = off()?;
        let jni_dlsym_lookup = off()?;
        let (portable_imt_conflict, portable_resolution, portable_to_interpreter_bridge) =
            match version {
                OatVersion::V045 => (Some(off()?), Some(off()?), Some(off()?)),
                OatVersion::V064 => (None, None, None),
            };
        let quick_generic_jni = off()?;
        let quick_imt_conflict = off()?;
        let quick_resolution = off()?;
        let quick_to_interpreter_bridge = off()?;

        let image_patch_delta = cur.read_i32()?;
        let image_file_location_oat_checksum = cur.read_u32()?;
        let image_file_location_oat_data_begin = cur.read_u32()?;
        let key_value_store_size = cur.read_u32()?;
        debug_assert_eq!(cur.pos(), version.header_size());

        Ok(Self {
            magic,
            version: version_bytes,
            checksum,
            instruction_set,
            instruction_set_features,
            dex_file_count,
            executable_offset,
            trampolines: Trampolines {
                interpreter_to_interpreter_bridge,
                interpreter_to_compiled_code_bridge,
                jni_dlsym_lookup,
                portable_imt_conflict,
                portable_resolution,
                portable_to_interpreter_bridge,
                quick_generic_jni,
                quick_imt_conflict,
                quick_resolution,
                quick_to_interpreter_bridge,
            },
            image_patch_delta,
            image_file_location_oat_checksum,
            image_file_location_oat_data_begin,
            key_value_store_size,
        })
    }

    /// Decoded instruction set, when the raw field is a known value.
    pub fn instruction_set(&self) -> Option<InstructionSet> {
        InstructionSet::from_raw(self.instruction_set)
    }
}

/// Check magic and version without binding.
pub fn is_valid_header(bytes: &[u8]) -> bool {
    bytes.len() >= 8 && bytes[..4] == OAT_MAGIC && OatVersion::from_header_bytes(bytes).is_some()
}

/// Iterator over the NUL-terminated key/value string pairs in the metadata
/// block between the fixed header and the descriptor stream.
///
/// Stops at the end of the block or at a truncated final pair.
#[derive(Clone, Debug)]
pub struct KeyValueIter<'a> {
    block: &'a [u8],
}

impl<'a> KeyValueIter<'a> {
    pub(crate) fn new(block: &'a [u8]) -> Self {
        Self { block }
    }
}

impl<'a> Iterator for KeyValueIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let key = split_nul(&mut self.block)?;
        let value = split_nul(&mut self.block)?;
        Some((key, value))
    }
}

fn split_nul<'a>(block: &mut &'a [u8]) -> Option<&'a [u8]> {
    let nul = block.iter().position(|&b| b == 0)?;
    let (s, rest) = block.split_at(nul);
    *block = &rest[1..];
    Some(s)
}
