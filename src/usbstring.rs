//! USB string descriptor decoding (§4.3 ambient addition).
//!
//! String descriptors are UTF-16LE, prefixed by the standard 2-byte
//! `bLength`/`bDescriptorType` header. Devices only speak a subset of the
//! Unicode BMP in practice, so this decodes straight to `char`, replacing
//! anything that doesn't round-trip with `U+FFFD`.

use alloc::string::String;

/// Decodes the body of a STRING descriptor (everything after the 2-byte
/// header) into a `String`.
pub fn decode(body: &[u8]) -> String {
    let mut units = alloc::vec::Vec::with_capacity(body.len() / 2);
    let mut chunks = body.chunks_exact(2);
    for pair in &mut chunks {
        units.push(u16::from_le_bytes([pair[0], pair[1]]));
    }
    char::decode_utf16(units.into_iter())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Default language ID to request a string descriptor in, when a device's
/// supported language list hasn't been read yet.
pub const DEFAULT_LANG_ID: u16 = crate::desc::lang_id::EN_US;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn decodes_ascii_body() {
        let body: &[u8] = &[b'h', 0, b'i', 0];
        assert_eq!(decode(body), "hi".to_string());
    }

    #[test]
    fn odd_trailing_byte_is_ignored() {
        let body: &[u8] = &[b'a', 0, 0xFF];
        assert_eq!(decode(body), "a".to_string());
    }
}
