//! Hand-assembled OAT images and fake dex collaborators for tests.
//!
//! [`ImageBuilder`] lays an image out as fixed header, key/value strings, a
//! scratch area holding payload tags and class records, then the descriptor
//! stream. The declared key/value store size covers the scratch area too, so
//! the descriptor stream starts exactly where binding expects it and
//! truncating the image tail cuts descriptors without touching earlier
//! payloads.

use std::cell::Cell;
use std::ops::Range;

use crate::dex::{DexFile, DexOpener};
use crate::error::OatError;
use crate::header::{OAT_MAGIC, OatVersion};

pub fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[derive(Clone, Debug)]
pub struct FakeMethodDef {
    pub name: &'static str,
    pub signature: &'static str,
}

#[derive(Clone, Debug)]
pub struct FakeClassDef {
    pub descriptor: &'static str,
    pub direct: Vec<FakeMethodDef>,
    pub virtuals: Vec<FakeMethodDef>,
}

/// In-memory dex structural view. Method indices follow dex layout: direct
/// methods first, then virtuals.
#[derive(Clone, Debug, Default)]
pub struct FakeDex {
    pub classes: Vec<FakeClassDef>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FakeClass {
    pub class_def_index: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FakeMethod {
    pub method_index: u32,
}

impl DexFile for FakeDex {
    type Class = FakeClass;
    type Method = FakeMethod;

    fn class_def_count(&self) -> u32 {
        self.classes.len() as u32
    }

    fn find_class(&self, descriptor: &str) -> Option<FakeClass> {
        self.classes
            .iter()
            .position(|c| c.descriptor == descriptor)
            .map(|i| FakeClass {
                class_def_index: i as u32,
            })
    }

    fn class_by_index(&self, class_def_index: u32) -> Option<FakeClass> {
        (class_def_index < self.class_def_count()).then_some(FakeClass { class_def_index })
    }

    fn class_def_index(&self, class: &FakeClass) -> u32 {
        class.class_def_index
    }

    fn find_direct_method(
        &self,
        class: &FakeClass,
        name: &str,
        signature: &str,
    ) -> Option<FakeMethod> {
        let def = &self.classes[class.class_def_index as usize];
        def.direct
            .iter()
            .position(|m| m.name == name && m.signature == signature)
            .map(|i| FakeMethod {
                method_index: i as u32,
            })
    }

    fn find_virtual_method(
        &self,
        class: &FakeClass,
        name: &str,
        signature: &str,
    ) -> Option<FakeMethod> {
        let def = &self.classes[class.class_def_index as usize];
        def.virtuals
            .iter()
            .position(|m| m.name == name && m.signature == signature)
            .map(|i| FakeMethod {
                method_index: (def.direct.len() + i) as u32,
            })
    }

    fn method_index(&self, method: &FakeMethod) -> u32 {
        method.method_index
    }
}

/// Opener that reads the payload's first byte as an index into its dex list
/// and counts how many times it ran, so tests can assert how many descriptor
/// decodes a lookup cost.
#[derive(Debug, Default)]
pub struct FakeOpener {
    pub dexes: Vec<FakeDex>,
    pub opens: Cell<usize>,
}

impl DexOpener for FakeOpener {
    type Dex = FakeDex;

    fn open(&self, payload: &[u8]) -> Result<FakeDex, OatError> {
        self.opens.set(self.opens.get() + 1);
        let tag = payload[0] as usize;
        self.dexes.get(tag).cloned().ok_or(OatError::BadDexMagic)
    }
}

/// One OAT-side class record to emit into the scratch area.
#[derive(Clone, Debug)]
pub struct ClassSpec {
    pub status: i16,
    /// Raw kind value, unvalidated so tests can emit unknown kinds.
    pub kind: u16,
    pub bitmap: Option<Vec<u8>>,
    /// Code offsets of the method-offsets table, one per table entry.
    pub methods: Vec<u32>,
}

impl ClassSpec {
    pub fn all_compiled(methods: Vec<u32>) -> Self {
        Self {
            status: 4,
            kind: 0,
            bitmap: None,
            methods,
        }
    }

    pub fn some_compiled(bitmap: Vec<u8>, methods: Vec<u32>) -> Self {
        Self {
            status: 4,
            kind: 1,
            bitmap: Some(bitmap),
            methods,
        }
    }

    pub fn none_compiled() -> Self {
        Self {
            status: 4,
            kind: 2,
            bitmap: None,
            methods: Vec::new(),
        }
    }
}

/// One descriptor to emit. `classes` length must match the fake dex's
/// class-def count; `None` emits the absent sentinel into the offset table.
#[derive(Clone, Debug)]
pub struct DexSpec {
    pub location: &'static str,
    pub checksum: u32,
    pub dex: FakeDex,
    pub classes: Vec<Option<ClassSpec>>,
    /// Replace the computed payload offset (0 emits the absent sentinel).
    pub payload_override: Option<u32>,
    /// Replace the computed class-def offset table.
    pub class_offsets_override: Option<Vec<u32>>,
}

impl DexSpec {
    pub fn new(location: &'static str, dex: FakeDex, classes: Vec<Option<ClassSpec>>) -> Self {
        Self {
            location,
            checksum: 0xd00d_0000,
            dex,
            classes,
            payload_override: None,
            class_offsets_override: None,
        }
    }
}

pub struct Image {
    pub bytes: Vec<u8>,
    pub opener: FakeOpener,
    /// Byte range of each descriptor within `bytes`.
    pub descriptor_ranges: Vec<Range<usize>>,
    /// File offset of each emitted class record, per dex.
    pub class_record_offsets: Vec<Vec<Option<usize>>>,
}

pub struct ImageBuilder {
    version: OatVersion,
    instruction_set: u32,
    key_values: Vec<(&'static str, &'static str)>,
    dexes: Vec<DexSpec>,
}

impl ImageBuilder {
    pub fn new(version: OatVersion) -> Self {
        Self {
            version,
            instruction_set: 4, // x86
            key_values: Vec::new(),
            dexes: Vec::new(),
        }
    }

    pub fn instruction_set(mut self, raw: u32) -> Self {
        self.instruction_set = raw;
        self
    }

    pub fn key_value(mut self, key: &'static str, value: &'static str) -> Self {
        self.key_values.push((key, value));
        self
    }

    pub fn dex(mut self, spec: DexSpec) -> Self {
        self.dexes.push(spec);
        self
    }

    pub fn build(self) -> Image {
        let header_size = self.version.header_size();

        let mut kv = Vec::new();
        for (k, v) in &self.key_values {
            kv.extend_from_slice(k.as_bytes());
            kv.push(0);
            kv.extend_from_slice(v.as_bytes());
            kv.push(0);
        }

        // Scratch area: one payload tag byte per dex, then its class records.
        let scratch_base = header_size + kv.len();
        let mut scratch = Vec::new();
        let mut payload_offsets = Vec::new();
        let mut class_record_offsets = Vec::new();
        for (i, spec) in self.dexes.iter().enumerate() {
            payload_offsets.push((scratch_base + scratch.len()) as u32);
            scratch.push(i as u8);
            let mut records = Vec::new();
            for class in &spec.classes {
                match class {
                    None => records.push(None),
                    Some(c) => {
                        records.push(Some(scratch_base + scratch.len()));
                        scratch.extend_from_slice(&c.status.to_le_bytes());
                        scratch.extend_from_slice(&c.kind.to_le_bytes());
                        if let Some(bitmap) = &c.bitmap {
                            push_u32(&mut scratch, bitmap.len() as u32);
                            scratch.extend_from_slice(bitmap);
                        }
                        for &code in &c.methods {
                            push_u32(&mut scratch, code);
                            if self.version == OatVersion::V045 {
                                push_u32(&mut scratch, 0); // gc-map offset
                            }
                        }
                    }
                }
            }
            class_record_offsets.push(records);
        }

        let key_value_store_size = (kv.len() + scratch.len()) as u32;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&OAT_MAGIC);
        bytes.extend_from_slice(&self.version.version_bytes());
        push_u32(&mut bytes, 0); // checksum
        push_u32(&mut bytes, self.instruction_set);
        push_u32(&mut bytes, 0); // instruction set features
        push_u32(&mut bytes, self.dexes.len() as u32);
        push_u32(&mut bytes, 0); // executable offset
        let trampolines = match self.version {
            OatVersion::V045 => 10,
            OatVersion::V064 => 7,
        };
        for _ in 0..trampolines {
            push_u32(&mut bytes, 0);
        }
        push_u32(&mut bytes, 0); // image patch delta
        push_u32(&mut bytes, 0); // image file location oat checksum
        push_u32(&mut bytes, 0); // image file location oat data begin
        push_u32(&mut bytes, key_value_store_size);
        assert_eq!(bytes.len(), header_size);

        bytes.extend_from_slice(&kv);
        bytes.extend_from_slice(&scratch);

        let mut descriptor_ranges = Vec::new();
        for (i, spec) in self.dexes.iter().enumerate() {
            let start = bytes.len();
            push_u32(&mut bytes, spec.location.len() as u32);
            bytes.extend_from_slice(spec.location.as_bytes());
            push_u32(&mut bytes, spec.checksum);
            push_u32(
                &mut bytes,
                spec.payload_override.unwrap_or(payload_offsets[i]),
            );
            match &spec.class_offsets_override {
                Some(table) => {
                    for &off in table {
                        push_u32(&mut bytes, off);
                    }
                }
                None => {
                    for record in &class_record_offsets[i] {
                        push_u32(&mut bytes, record.map_or(0, |off| off as u32));
                    }
                }
            }
            descriptor_ranges.push(start..bytes.len());
        }

        let opener = FakeOpener {
            dexes: self.dexes.into_iter().map(|s| s.dex).collect(),
            opens: Cell::new(0),
        };

        Image {
            bytes,
            opener,
            descriptor_ranges,
            class_record_offsets,
        }
    }
}

/// Two-class dex used by most navigation tests.
pub fn sample_dex() -> FakeDex {
    FakeDex {
        classes: vec![
            FakeClassDef {
                descriptor: "Lcom/example/Main;",
                direct: vec![
                    FakeMethodDef {
                        name: "<init>",
                        signature: "()V",
                    },
                    FakeMethodDef {
                        name: "main",
                        signature: "([Ljava/lang/String;)V",
                    },
                ],
                virtuals: vec![FakeMethodDef {
                    name: "run",
                    signature: "()V",
                }],
            },
            FakeClassDef {
                descriptor: "Lcom/example/Util;",
                direct: vec![FakeMethodDef {
                    name: "helper",
                    signature: "()I",
                }],
                virtuals: Vec::new(),
            },
        ],
    }
}
