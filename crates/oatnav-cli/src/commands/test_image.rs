//! Hand-assembled 064 image shared by the command rendering tests: one dex
//! file with two classes, the first fully compiled, the second
//! interpreter-only.

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn sample_image() -> Vec<u8> {
    let kv = b"compiler-filter\0speed\0";
    let loc = b"classes.dex";
    let header_size = 72;
    let descriptor_len = 4 + loc.len() + 4 + 4 + 2 * 4;
    let payload_offset = header_size + kv.len() + descriptor_len;
    let record0 = payload_offset + 112;
    let record1 = record0 + 4 + 2 * 4;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"oat\n064\0");
    push_u32(&mut bytes, 0xad1e_5000); // checksum
    push_u32(&mut bytes, 1); // arm
    push_u32(&mut bytes, 0); // instruction set features
    push_u32(&mut bytes, 1); // dex file count
    push_u32(&mut bytes, 0x1000); // executable offset
    for _ in 0..7 {
        push_u32(&mut bytes, 0); // trampolines
    }
    push_u32(&mut bytes, 0); // image patch delta
    push_u32(&mut bytes, 0); // image file location oat checksum
    push_u32(&mut bytes, 0); // image file location oat data begin
    push_u32(&mut bytes, kv.len() as u32);
    assert_eq!(bytes.len(), header_size);
    bytes.extend_from_slice(kv);

    // descriptor
    push_u32(&mut bytes, loc.len() as u32);
    bytes.extend_from_slice(loc);
    push_u32(&mut bytes, 0x1122_3344);
    push_u32(&mut bytes, payload_offset as u32);
    push_u32(&mut bytes, record0 as u32);
    push_u32(&mut bytes, record1 as u32);

    // embedded dex header
    let mut dex = vec![0u8; 112];
    dex[..4].copy_from_slice(b"dex\n");
    dex[4..8].copy_from_slice(b"035\0");
    dex[8..12].copy_from_slice(&0x55aa_0001u32.to_le_bytes());
    dex[32..36].copy_from_slice(&112u32.to_le_bytes());
    dex[96..100].copy_from_slice(&2u32.to_le_bytes());
    assert_eq!(bytes.len(), payload_offset);
    bytes.extend_from_slice(&dex);

    // class 0: all methods compiled, two table entries
    bytes.extend_from_slice(&4i16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    push_u32(&mut bytes, 0x2001);
    push_u32(&mut bytes, 0x2040);

    // class 1: interpreter-only
    assert_eq!(bytes.len(), record1);
    bytes.extend_from_slice(&1i16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());

    bytes
}
