use std::fmt::Write as _;
use std::path::Path;

use oatnav_format::{DexFile, OatDexFile};
use serde::Serialize;

pub fn run(path: &Path, json: bool) {
    let map = super::map_file(path);
    let oat = super::bind(&map);
    let mut rows = Vec::new();
    for dex_file in oat.dex_files() {
        match dex_file {
            Ok(dex_file) => rows.push(DexRow::from_dex_file(&dex_file)),
            Err(e) => super::fail(e),
        }
    }
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).expect("report serialization failed")
        );
    } else {
        print!("{}", render(&rows));
    }
}

#[derive(Serialize)]
struct DexRow {
    index: u32,
    location: String,
    checksum: u32,
    payload_offset: usize,
    class_defs: u32,
}

impl DexRow {
    fn from_dex_file<D: DexFile>(dex_file: &OatDexFile<'_, D>) -> Self {
        Self {
            index: dex_file.index(),
            location: dex_file.location().into_owned(),
            checksum: dex_file.checksum(),
            payload_offset: dex_file.payload_offset(),
            class_defs: dex_file.class_def_count(),
        }
    }
}

fn render(rows: &[DexRow]) -> String {
    let mut out = String::new();
    for row in rows {
        writeln!(out, "#{} {}", row.index, row.location).unwrap();
        writeln!(out, "   checksum: {:#010x}", row.checksum).unwrap();
        writeln!(out, "   payload offset: {:#x}", row.payload_offset).unwrap();
        writeln!(out, "   classes: {}", row.class_defs).unwrap();
    }
    out
}
