use std::fmt::Write as _;
use std::path::Path;

use oatnav_format::{OatHeader, OatVersion};
use serde::Serialize;

pub fn run(path: &Path, json: bool) {
    let map = super::map_file(path);
    let oat = super::bind(&map);
    let pairs = match oat.key_values() {
        Ok(iter) => collect_pairs(iter),
        Err(e) => super::fail(e),
    };
    if json {
        println!("{}", render_json(oat.version(), oat.header(), &pairs));
    } else {
        print!("{}", render(oat.version(), oat.header(), &pairs));
    }
}

fn collect_pairs<'a>(iter: impl Iterator<Item = (&'a [u8], &'a [u8])>) -> Vec<(String, String)> {
    iter.map(|(k, v)| {
        (
            String::from_utf8_lossy(k).into_owned(),
            String::from_utf8_lossy(v).into_owned(),
        )
    })
    .collect()
}

fn render(version: OatVersion, header: &OatHeader, pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    let isa = header.instruction_set().map_or("unknown", |i| i.name());
    writeln!(out, "version: {}", version.name()).unwrap();
    writeln!(out, "checksum: {:#010x}", header.checksum).unwrap();
    writeln!(out, "instruction set: {} ({})", isa, header.instruction_set).unwrap();
    writeln!(out, "dex files: {}", header.dex_file_count).unwrap();
    writeln!(out, "executable offset: {:#x}", header.executable_offset).unwrap();
    writeln!(out, "image patch delta: {}", header.image_patch_delta).unwrap();
    writeln!(out, "key/value store: {} bytes", header.key_value_store_size).unwrap();
    for (k, v) in pairs {
        writeln!(out, "  {k} = {v}").unwrap();
    }
    out
}

#[derive(Serialize)]
struct KeyValue<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct InfoReport<'a> {
    version: &'static str,
    checksum: u32,
    instruction_set: Option<&'static str>,
    instruction_set_raw: u32,
    dex_file_count: u32,
    executable_offset: u32,
    image_patch_delta: i32,
    key_values: Vec<KeyValue<'a>>,
}

fn render_json(version: OatVersion, header: &OatHeader, pairs: &[(String, String)]) -> String {
    let report = InfoReport {
        version: version.name(),
        checksum: header.checksum,
        instruction_set: header.instruction_set().map(|i| i.name()),
        instruction_set_raw: header.instruction_set,
        dex_file_count: header.dex_file_count,
        executable_offset: header.executable_offset,
        image_patch_delta: header.image_patch_delta,
        key_values: pairs
            .iter()
            .map(|(k, v)| KeyValue { key: k, value: v })
            .collect(),
    };
    serde_json::to_string_pretty(&report).expect("report serialization failed")
}

#[cfg(test)]
mod tests {
    use oatnav_format::{OatFile, RawDexOpener};

    use super::super::test_image::sample_image;
    use super::*;

    #[test]
    fn renders_header_and_key_values() {
        let bytes = sample_image();
        let oat = OatFile::bind_auto(&bytes, RawDexOpener).unwrap();
        let pairs = collect_pairs(oat.key_values().unwrap());
        let text = render(oat.version(), oat.header(), &pairs);
        insta::assert_snapshot!(text, @r"
version: 064
checksum: 0xad1e5000
instruction set: arm (1)
dex files: 1
executable offset: 0x1000
image patch delta: 0
key/value store: 22 bytes
  compiler-filter = speed
");
    }

    #[test]
    fn json_report_round_trips() {
        let bytes = sample_image();
        let oat = OatFile::bind_auto(&bytes, RawDexOpener).unwrap();
        let pairs = collect_pairs(oat.key_values().unwrap());
        let json = render_json(oat.version(), oat.header(), &pairs);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "064");
        assert_eq!(value["instruction_set"], "arm");
        assert_eq!(value["dex_file_count"], 1);
        assert_eq!(value["key_values"][0]["key"], "compiler-filter");
        assert_eq!(value["key_values"][0]["value"], "speed");
    }
}
