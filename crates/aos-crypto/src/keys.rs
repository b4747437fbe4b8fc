//! # Key-Material Decoding
//!
//! Keys arrive from operators as strings — environment variables, CLI
//! flags, config files — in either lowercase/uppercase hex or standard
//! Base64. The decoder here resolves the ambiguity deterministically:
//! a string that consists entirely of hex digits and has length 64 or 128
//! is treated as hex; everything else is treated as Base64.
//!
//! Undecodable input fails with [`CryptoError::KeyDecode`]; length
//! enforcement happens at key construction, not here.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::CryptoError;

/// Decode key material from hex (64 or 128 chars, tried first) or
/// standard Base64.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDecode`] when the string is neither valid
/// hex of the expected length nor valid Base64.
pub fn decode_key_material(s: &str) -> Result<Vec<u8>, CryptoError> {
    let s = s.trim();
    if matches!(s.len(), 64 | 128) && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return hex_to_bytes(s).map_err(CryptoError::KeyDecode);
    }
    BASE64
        .decode(s)
        .map_err(|e| CryptoError::KeyDecode(e.to_string()))
}

/// Encode bytes as a lowercase hex string.
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string into bytes.
pub(crate) fn hex_to_bytes(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("hex string has odd length: {}", s.len()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_64_chars_decodes_as_hex() {
        let hex = "ab".repeat(32);
        let bytes = decode_key_material(&hex).unwrap();
        assert_eq!(bytes, vec![0xab; 32]);
    }

    #[test]
    fn hex_128_chars_decodes_as_hex() {
        let hex = "0f".repeat(64);
        let bytes = decode_key_material(&hex).unwrap();
        assert_eq!(bytes, vec![0x0f; 64]);
    }

    #[test]
    fn uppercase_hex_accepted() {
        let hex = "AB".repeat(32);
        let bytes = decode_key_material(&hex).unwrap();
        assert_eq!(bytes, vec![0xab; 32]);
    }

    #[test]
    fn base64_decodes_when_not_hex_shaped() {
        let encoded = BASE64.encode([7u8; 32]);
        let bytes = decode_key_material(&encoded).unwrap();
        assert_eq!(bytes, vec![7u8; 32]);
    }

    #[test]
    fn all_hex_base64_of_wrong_length_falls_through_to_base64() {
        // 44 chars of hex digits is not a hex-shaped key length, so it is
        // decoded as Base64.
        let encoded = BASE64.encode([0u8; 32]);
        assert_eq!(encoded.len(), 44);
        let bytes = decode_key_material(&encoded).unwrap();
        assert_eq!(bytes, vec![0u8; 32]);
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        let hex = format!("  {}\n", "cd".repeat(32));
        let bytes = decode_key_material(&hex).unwrap();
        assert_eq!(bytes, vec![0xcd; 32]);
    }

    #[test]
    fn garbage_rejected() {
        let err = decode_key_material("not hex, not base64!!").unwrap_err();
        assert!(matches!(err, CryptoError::KeyDecode(_)));
    }

    #[test]
    fn hex_helpers_round_trip() {
        let bytes = [0u8, 1, 0xfe, 0xff];
        let hex = bytes_to_hex(&bytes);
        assert_eq!(hex, "0001feff");
        assert_eq!(hex_to_bytes(&hex).unwrap(), bytes);
    }
}
