//! Resolved methods and their native entry addresses.

use crate::error::OatError;
use crate::header::InstructionSet;
use crate::region::{FileOffset, Region};

/// A method resolved inside one class: the structural handle from the dex
/// collaborator plus its optional compiled-code offset.
///
/// A method can be definitively found yet have no compiled code — the
/// interpreter executes it. That state is queried with
/// [`has_native_code`](Self::has_native_code) and is never reported as a
/// not-found error.
#[derive(Debug)]
pub struct OatMethod<'a, M> {
    region: Region<'a>,
    instruction_set: u32,
    structural: M,
    code_offset: FileOffset,
}

impl<'a, M> OatMethod<'a, M> {
    pub(crate) fn new(
        region: Region<'a>,
        instruction_set: u32,
        structural: M,
        code_offset: FileOffset,
    ) -> Self {
        Self {
            region,
            instruction_set,
            structural,
            code_offset,
        }
    }

    /// The collaborator's method handle.
    pub fn structural(&self) -> &M {
        &self.structural
    }

    /// File-relative offset of the compiled entry; the absent sentinel means
    /// the method is interpreter-only.
    pub fn code_offset(&self) -> FileOffset {
        self.code_offset
    }

    /// Whether the method has an ahead-of-time-compiled entry.
    pub fn has_native_code(&self) -> bool {
        !self.code_offset.is_absent()
    }

    /// Absolute address of the compiled entry inside the mapped region.
    ///
    /// Fails with [`OatError::NoCompiledCode`] for interpreter-only methods;
    /// callers either check [`has_native_code`](Self::has_native_code) first
    /// or treat that error as the authoritative "no entry" signal.
    pub fn entry_address(&self) -> Result<*const u8, OatError> {
        let offset = self.code_offset.get().ok_or(OatError::NoCompiledCode)?;
        self.region.address_of(offset)
    }

    /// Executable code pointer: the entry address with the instruction-set
    /// selection encoding stripped (Thumb bit on ARM).
    pub fn code_pointer(&self) -> Result<*const u8, OatError> {
        let isa = InstructionSet::from_raw(self.instruction_set).ok_or(
            OatError::UnknownInstructionSet {
                raw: self.instruction_set,
            },
        )?;
        self.code_pointer_with(|addr| isa.entry_point_to_code_pointer(addr))
    }

    /// Like [`code_pointer`](Self::code_pointer), but with a caller-supplied
    /// entry-to-code translation, for images whose instruction set the
    /// caller understands better than the header does.
    pub fn code_pointer_with(
        &self,
        translate: impl FnOnce(usize) -> usize,
    ) -> Result<*const u8, OatError> {
        let addr = self.entry_address()? as usize;
        Ok(translate(addr) as *const u8)
    }
}
