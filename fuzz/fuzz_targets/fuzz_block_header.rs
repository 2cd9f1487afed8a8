#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_blocks::parsing::{decode_block_header, ArchiveVersion};

fuzz_target!(|data: &[u8]| {
    for version in [ArchiveVersion::Legacy, ArchiveVersion::Current] {
        if let Ok(header) = decode_block_header(data, 0, version) {
            // Both eras have at least 7 bytes of common fields
            assert!(header.header_size >= 7);
            let _ = header.next_offset();
        }
    }
});
