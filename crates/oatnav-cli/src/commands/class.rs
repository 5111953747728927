use std::fmt::Write as _;
use std::path::Path;

use oatnav_format::{OatClass, OatClassKind};
use serde::Serialize;

pub fn run(path: &Path, dex_selector: &str, index: u32, method: Option<u32>, json: bool) {
    let map = super::map_file(path);
    let oat = super::bind(&map);
    let dex_file = super::resolve_dex(&oat, dex_selector);
    let class = match dex_file.class_by_index(index) {
        Ok(class) => class,
        Err(e) => super::fail(e),
    };
    let method = method.map(|method_index| {
        match class.method_code_offset(method_index) {
            Ok(offset) => MethodReport {
                method_index,
                code_offset: offset.get().map(|o| o as u32),
            },
            Err(e) => super::fail(e),
        }
    });

    let location = dex_file.location();
    let report = ClassReport::new(&location, &class, method);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("report serialization failed")
        );
    } else {
        print!("{}", render(&report));
    }
}

#[derive(Serialize)]
struct MethodReport {
    method_index: u32,
    /// `None` means interpreter-only.
    code_offset: Option<u32>,
}

#[derive(Serialize)]
struct ClassReport<'a> {
    dex: &'a str,
    class_def_index: u32,
    status: i16,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bitmap_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<MethodReport>,
}

impl<'a> ClassReport<'a> {
    fn new<C>(dex: &'a str, class: &OatClass<'_, C>, method: Option<MethodReport>) -> Self {
        Self {
            dex,
            class_def_index: class.class_def_index(),
            status: class.status(),
            kind: class.kind().name(),
            bitmap_bytes: (class.kind() == OatClassKind::SomeCompiled)
                .then(|| class.bitmap().len()),
            method,
        }
    }
}

fn render(report: &ClassReport<'_>) -> String {
    let mut out = String::new();
    writeln!(out, "class #{} in {}", report.class_def_index, report.dex).unwrap();
    writeln!(out, "status: {}", report.status).unwrap();
    writeln!(out, "kind: {}", report.kind).unwrap();
    if let Some(bytes) = report.bitmap_bytes {
        writeln!(out, "bitmap: {bytes} bytes").unwrap();
    }
    if let Some(method) = &report.method {
        match method.code_offset {
            Some(offset) => {
                writeln!(out, "method #{}: code offset {offset:#x}", method.method_index).unwrap();
            }
            None => writeln!(out, "method #{}: no compiled code", method.method_index).unwrap(),
        }
    }
    out
}
