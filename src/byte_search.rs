//! Fast byte search using platform SIMD where available, SWAR fallback elsewhere.
//!
//! Used by the signature scanner to walk up to a megabyte of self-extractor
//! stub looking for the RAR magic.

/// Find first occurrence of `needle` in `haystack`.
#[inline]
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: SSE2 is guaranteed on x86_64. All pointer accesses are bounds-checked.
        unsafe { sse2::find_byte(haystack, needle) }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        swar::find_byte(haystack, needle)
    }
}

/// Find the first occurrence of the byte sequence `needle` in `haystack`.
///
/// Candidates are located by the first byte of `needle` and then compared in full.
pub fn find_sequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let (&first, rest) = needle.split_first()?;
    let mut from = 0;
    while from + needle.len() <= haystack.len() {
        let candidate = from + find_byte(&haystack[from..=haystack.len() - needle.len()], first)?;
        if haystack[candidate + 1..candidate + needle.len()] == *rest {
            return Some(candidate);
        }
        from = candidate + 1;
    }
    None
}

/// SSE2 implementation: 16 bytes per cycle, guaranteed available on x86_64.
#[cfg(target_arch = "x86_64")]
mod sse2 {
    use core::arch::x86_64::{
        __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8,
    };

    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub unsafe fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
        let needle_v = _mm_set1_epi8(needle as i8);
        let len = haystack.len();
        let ptr = haystack.as_ptr();
        let mut i = 0;

        while i + 16 <= len {
            let chunk = _mm_loadu_si128(ptr.add(i).cast::<__m128i>());
            let cmp = _mm_cmpeq_epi8(chunk, needle_v);
            let mask = _mm_movemask_epi8(cmp) as u32;
            if mask != 0 {
                return Some(i + mask.trailing_zeros() as usize);
            }
            i += 16;
        }

        while i < len {
            if *ptr.add(i) == needle {
                return Some(i);
            }
            i += 1;
        }
        None
    }
}

/// SWAR fallback: 8 bytes per cycle using u64 arithmetic.
#[cfg(not(target_arch = "x86_64"))]
mod swar {
    const LO: u64 = 0x0101_0101_0101_0101;
    const HI: u64 = 0x8080_8080_8080_8080;

    #[inline]
    pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
        let broadcast = LO.wrapping_mul(u64::from(needle));
        // SAFETY: align_to reinterprets aligned bytes as u64
        let (prefix, chunks, suffix) = unsafe { haystack.align_to::<u64>() };

        for (i, &b) in prefix.iter().enumerate() {
            if b == needle {
                return Some(i);
            }
        }
        let prefix_len = prefix.len();
        for (ci, &chunk) in chunks.iter().enumerate() {
            let xored = chunk ^ broadcast;
            let has_match = xored.wrapping_sub(LO) & !xored & HI;
            if has_match != 0 {
                return Some(prefix_len + ci * 8 + (has_match.trailing_zeros() as usize / 8));
            }
        }
        let suffix_start = prefix_len + chunks.len() * 8;
        for (i, &b) in suffix.iter().enumerate() {
            if b == needle {
                return Some(suffix_start + i);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_find_byte() {
        let data = b"hello world, this is longer than sixteen bytes!";
        assert_eq!(find_byte(data, b'h'), Some(0));
        assert_eq!(find_byte(data, b'!'), Some(data.len() - 1));
        assert_eq!(find_byte(data, b'Z'), None);
        assert_eq!(find_byte(&[], b'a'), None);
    }

    #[test]
    fn test_find_sequence() {
        let mut data = vec![0x52u8; 40];
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        assert_eq!(find_sequence(&data, b"Rar!\x1a\x07"), Some(40));
        assert_eq!(find_sequence(b"Rar!\x1a", b"Rar!\x1a\x07"), None);
        assert_eq!(find_sequence(b"Rar!\x1a\x07", b"Rar!\x1a\x07"), Some(0));
        assert_eq!(find_sequence(b"abc", b""), None);
    }

    #[quickcheck]
    fn find_sequence_matches_naive(haystack: Vec<u8>, needle: Vec<u8>) -> bool {
        let naive = if needle.is_empty() {
            None
        } else {
            haystack.windows(needle.len()).position(|w| w == needle.as_slice())
        };
        find_sequence(&haystack, &needle) == naive
    }

    #[quickcheck]
    fn find_byte_matches_iter(haystack: Vec<u8>, needle: u8) -> bool {
        find_byte(&haystack, needle) == haystack.iter().position(|&b| b == needle)
    }
}
