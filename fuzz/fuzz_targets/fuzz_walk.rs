#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_blocks::{ArchiveWalker, ParseOptions};
use std::io::Cursor;

// Walk arbitrary bytes, with a RAR5 marker prepended half of the time so
// the walker gets past the scanner.
fuzz_target!(|data: &[u8]| {
    const RAR5_MARKER: &[u8] = &[0x52, 0x61, 0x72, 0x21, 0x1a, 0x07, 0x01, 0x00];

    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let input = if selector & 1 == 0 {
        let mut input = RAR5_MARKER.to_vec();
        input.extend_from_slice(rest);
        input
    } else {
        rest.to_vec()
    };

    let opts = ParseOptions {
        verify_crc: selector & 2 != 0,
        ..ParseOptions::default()
    };
    let mut source = Cursor::new(input);
    let Ok(walker) = ArchiveWalker::open(&mut source, opts) else {
        return;
    };

    let mut last_offset = None;
    for block in walker {
        let Ok(block) = block else { break };
        // Blocks come out in strictly increasing file order
        if let Some(prev) = last_offset {
            assert!(block.offset > prev);
        }
        last_offset = Some(block.offset);
    }
});
