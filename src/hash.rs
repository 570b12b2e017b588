//! FNV-1a hashing for the net-index dictionary checksum.
//!
//! Client and server hash their net-index order and compare the result; a
//! mismatch means the two processes built different dictionaries.

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hash, usable in const contexts.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    fnv1a_64_extend(FNV_OFFSET, bytes)
}

/// Continue an FNV-1a hash with more bytes.
pub const fn fnv1a_64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Checksum of a sequence of tag names, case-insensitive.
///
/// Each name is lowercased and followed by a zero byte, so `["AB", "C"]` and
/// `["A", "BC"]` hash differently.
pub fn names_checksum<'a, I>(names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().fold(FNV_OFFSET, |hash, name| {
        let hash = name
            .chars()
            .flat_map(char::to_lowercase)
            .fold(hash, |h, c| {
                let mut buf = [0u8; 4];
                fnv1a_64_extend(h, c.encode_utf8(&mut buf).as_bytes())
            });
        fnv1a_64_extend(hash, &[0])
    })
}
