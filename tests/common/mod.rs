#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub enum Entry<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

pub fn build_zip(entries: &[Entry<'_>], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);
    for entry in entries {
        match entry {
            Entry::File(name, data) => {
                writer.start_file(*name, options).expect("start file");
                writer.write_all(data).expect("write file");
            }
            Entry::Dir(name) => writer.add_directory(*name, options).expect("add directory"),
        }
    }
    writer.finish().expect("finish archive").into_inner()
}

/// `a.txt` (10 bytes), `b/` (folder), `b/c.txt` (5 bytes).
pub fn scenario_zip() -> Vec<u8> {
    build_zip(
        &[
            Entry::File("a.txt", b"0123456789"),
            Entry::Dir("b/"),
            Entry::File("b/c.txt", b"hello"),
        ],
        CompressionMethod::Deflated,
    )
}

pub fn text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog\n"
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Offset of the first payload byte of the entry called `name`.
pub fn payload_offset(archive: &[u8], name: &str) -> usize {
    let name = name.as_bytes();
    for offset in 0..archive.len().saturating_sub(30) {
        if &archive[offset..offset + 4] != b"PK\x03\x04" {
            continue;
        }
        let name_len = u16::from_le_bytes([archive[offset + 26], archive[offset + 27]]) as usize;
        let extra_len = u16::from_le_bytes([archive[offset + 28], archive[offset + 29]]) as usize;
        let start = offset + 30;
        if archive.get(start..start + name_len) == Some(name) {
            return start + name_len + extra_len;
        }
    }
    panic!("no local header for {}", String::from_utf8_lossy(name));
}

/// Flip the first `len` payload bytes of the entry called `name`.
pub fn corrupt_payload(archive: &mut [u8], name: &str, len: usize) {
    let start = payload_offset(archive, name);
    for byte in &mut archive[start..start + len] {
        *byte ^= 0xFF;
    }
}

/// Replace every occurrence of `from` with `to` (same length).
pub fn patch_bytes(archive: &mut [u8], from: &[u8], to: &[u8]) {
    assert_eq!(from.len(), to.len());
    let mut offset = 0;
    while offset + from.len() <= archive.len() {
        if &archive[offset..offset + from.len()] == from {
            archive[offset..offset + from.len()].copy_from_slice(to);
            offset += from.len();
        } else {
            offset += 1;
        }
    }
}

/// Archive whose every size and offset lives in ZIP64 extra fields, closed by
/// a ZIP64 end of central directory record and locator. Entries are stored;
/// names ending in `/` become folders.
pub fn zip64_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    const SATURATED: u32 = 0xFFFF_FFFF;

    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let crc = crc.sum();
        let size = data.len() as u64;
        let lfh_offset = out.len() as u64;

        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&45u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&0u16.to_le_bytes()); // time
        out.extend_from_slice(&0u16.to_le_bytes()); // date
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&SATURATED.to_le_bytes());
        out.extend_from_slice(&SATURATED.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(data);

        central.extend_from_slice(b"PK\x01\x02");
        central.extend_from_slice(&45u16.to_le_bytes()); // made by
        central.extend_from_slice(&45u16.to_le_bytes()); // version needed
        central.extend_from_slice(&0u16.to_le_bytes()); // flags
        central.extend_from_slice(&0u16.to_le_bytes()); // stored
        central.extend_from_slice(&0u16.to_le_bytes()); // time
        central.extend_from_slice(&0u16.to_le_bytes()); // date
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&SATURATED.to_le_bytes());
        central.extend_from_slice(&SATURATED.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&28u16.to_le_bytes()); // extra length
        central.extend_from_slice(&0u16.to_le_bytes()); // comment length
        central.extend_from_slice(&0u16.to_le_bytes()); // disk start
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&SATURATED.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
        central.extend_from_slice(&1u16.to_le_bytes());
        central.extend_from_slice(&24u16.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&lfh_offset.to_le_bytes());
    }

    let cd_offset = out.len() as u64;
    let cd_size = central.len() as u64;
    let count = entries.len() as u64;
    out.extend_from_slice(&central);

    let eocd64_offset = out.len() as u64;
    out.extend_from_slice(b"PK\x06\x06");
    out.extend_from_slice(&44u64.to_le_bytes()); // remaining record size
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&45u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // this disk
    out.extend_from_slice(&0u32.to_le_bytes()); // disk with central directory
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());

    out.extend_from_slice(b"PK\x06\x07");
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&eocd64_offset.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // total disks

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0xFFFFu16.to_le_bytes());
    out.extend_from_slice(&0xFFFFu16.to_le_bytes());
    out.extend_from_slice(&SATURATED.to_le_bytes());
    out.extend_from_slice(&SATURATED.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment length
    out
}
