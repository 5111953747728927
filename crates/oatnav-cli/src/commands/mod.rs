pub mod class;
pub mod dex_files;
pub mod info;

#[cfg(test)]
mod test_image;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use oatnav_format::{OatDexFile, OatFile, RawDexHeader, RawDexOpener};

pub(crate) fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {msg}");
    std::process::exit(1);
}

pub(crate) fn map_file(path: &Path) -> Mmap {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => fail(format_args!("{}: {e}", path.display())),
    };
    // Safety: read-only map; the file must not be truncated while the
    // command runs.
    match unsafe { Mmap::map(&file) } {
        Ok(map) => map,
        Err(e) => fail(format_args!("{}: {e}", path.display())),
    }
}

pub(crate) fn bind(bytes: &[u8]) -> OatFile<'_, RawDexOpener> {
    if !oatnav_format::is_valid_header(bytes) {
        fail("not an oat image (bad magic or unsupported version)");
    }
    match OatFile::bind_auto(bytes, RawDexOpener) {
        Ok(oat) => oat,
        Err(e) => fail(e),
    }
}

/// Resolve the `--dex` selector: a stream index if it parses as one, a
/// location string otherwise.
pub(crate) fn resolve_dex<'a>(
    oat: &OatFile<'a, RawDexOpener>,
    selector: &str,
) -> OatDexFile<'a, RawDexHeader> {
    let result = match selector.parse::<u32>() {
        Ok(index) => oat.dex_file_by_index(index),
        Err(_) => oat.dex_file_by_location(selector),
    };
    match result {
        Ok(dex_file) => dex_file,
        Err(e) => fail(e),
    }
}
