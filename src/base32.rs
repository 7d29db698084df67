use std::{ffi::CStr, str::from_utf8_unchecked};

use crate::{DecodeMode, Error, ULID_LEN, ULID_TERMINATED_LEN};

// cspell:disable-next-line
const ALPHABET: [u8; 32] = *b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

pub fn encode(mut n: u128, buffer: &mut [u8; ULID_LEN]) -> &str {
    for byte in buffer.iter_mut().rev() {
        *byte = ALPHABET[(n & 0x1F) as usize];
        n >>= 5;
    }

    // Safety: Encoding above guarantees valid UTF-8
    unsafe { from_utf8_unchecked(buffer) }
}

pub fn encode_terminated(n: u128, buffer: &mut [u8; ULID_TERMINATED_LEN]) -> &CStr {
    let mut text = [0; ULID_LEN];
    encode(n, &mut text);

    buffer[..ULID_LEN].copy_from_slice(&text);
    buffer[ULID_LEN] = 0;

    // Safety: Alphabet symbols are never NUL, and the last byte is
    unsafe { CStr::from_bytes_with_nul_unchecked(buffer) }
}

/// Maps one ASCII byte to its 5-bit value.
///
/// Lower case is always accepted. The ambiguous letters `I`, `L` and `O`
/// are only accepted in [`DecodeMode::Crockford`], `U` never.
fn symbol(c: u8, mode: DecodeMode) -> Option<u8> {
    #[rustfmt::skip]
    const DECODE: [i8; 128] = [
        /* 0x00 */  -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
        /* 0x10 */  -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
        /* 0x20 */  -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
        /* 0x30 */   0,  1,  2,  3,  4,  5,  6,  7,  8,  9, -1, -1, -1, -1, -1, -1,
        /* 0x40 */  -1, 10, 11, 12, 13, 14, 15, 16, 17, -1, 18, 19, -1, 20, 21, -1,
        /* 0x50 */  22, 23, 24, 25, 26, -1, 27, 28, 29, 30, 31, -1, -1, -1, -1, -1,
        /* 0x60 */  -1, 10, 11, 12, 13, 14, 15, 16, 17, -1, 18, 19, -1, 20, 21, -1,
        /* 0x70 */  22, 23, 24, 25, 26, -1, 27, 28, 29, 30, 31, -1, -1, -1, -1, -1,
    ];

    match (mode, c) {
        (DecodeMode::Crockford, b'i' | b'I' | b'l' | b'L') => Some(1),
        (DecodeMode::Crockford, b'o' | b'O') => Some(0),
        _ => DECODE.get(usize::from(c)).and_then(|&value| u8::try_from(value).ok()),
    }
}

pub fn decode(ascii_bytes: &[u8; ULID_LEN], mode: DecodeMode) -> Result<u128, Error> {
    let mut n = 0;

    for (index, &byte) in ascii_bytes.iter().enumerate() {
        let value = symbol(byte, mode).ok_or(Error::InvalidCharacter { index })?;

        // The first symbol only carries the top 3 bits.
        if index == 0 && value > 7 {
            return Err(Error::InvalidCharacter { index });
        }

        n = (n << 5) | u128::from(value);
    }

    Ok(n)
}

pub fn validate(ascii_bytes: &[u8; ULID_LEN], mode: DecodeMode) -> Result<(), Error> {
    decode(ascii_bytes, mode).map(|_| ())
}

pub fn canonicalize(buffer: &mut [u8; ULID_LEN]) -> Result<&str, Error> {
    for (index, byte) in buffer.iter_mut().enumerate() {
        let value = symbol(*byte, DecodeMode::Crockford).ok_or(Error::InvalidCharacter { index })?;

        if index == 0 && value > 7 {
            return Err(Error::InvalidCharacter { index });
        }

        *byte = ALPHABET[usize::from(value)];
    }

    // Safety: Every byte was replaced by an alphabet symbol above
    Ok(unsafe { from_utf8_unchecked(buffer) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(s: &str, mode: DecodeMode) -> Result<u128, Error> {
        decode(s.as_bytes().try_into().unwrap(), mode)
    }

    #[test]
    fn test_encode_extremes() {
        let mut buffer = [0; ULID_LEN];
        assert_eq!(encode(0, &mut buffer), "00000000000000000000000000");
        assert_eq!(encode(1, &mut buffer), "00000000000000000000000001");
        assert_eq!(encode(u128::MAX, &mut buffer), "7ZZZZZZZZZZZZZZZZZZZZZZZZZ");
    }

    #[test]
    fn test_encode_terminated() {
        let mut buffer = [0xFF; ULID_TERMINATED_LEN];
        let text = encode_terminated(u128::MAX, &mut buffer);

        assert_eq!(text.to_str(), Ok("7ZZZZZZZZZZZZZZZZZZZZZZZZZ"));
        assert_eq!(buffer[ULID_LEN], 0);
    }

    #[test]
    fn test_every_symbol_round_trips() {
        for (value, &c) in ALPHABET.iter().enumerate() {
            assert_eq!(symbol(c, DecodeMode::Strict), Some(value as u8));
            assert_eq!(symbol(c.to_ascii_lowercase(), DecodeMode::Strict), Some(value as u8));
        }
    }

    #[test]
    fn test_strict_rejects_ambiguous_letters() {
        for c in [b'I', b'i', b'L', b'l', b'O', b'o', b'U', b'u'] {
            assert_eq!(symbol(c, DecodeMode::Strict), None);
        }
    }

    #[test]
    fn test_crockford_normalizes_ambiguous_letters() {
        assert_eq!(symbol(b'I', DecodeMode::Crockford), Some(1));
        assert_eq!(symbol(b'l', DecodeMode::Crockford), Some(1));
        assert_eq!(symbol(b'o', DecodeMode::Crockford), Some(0));
        assert_eq!(symbol(b'U', DecodeMode::Crockford), None);
        assert_eq!(symbol(0xFF, DecodeMode::Crockford), None);
        assert_eq!(symbol(0x80, DecodeMode::Strict), None);
    }

    #[test]
    fn test_decode_reports_first_bad_position() {
        assert_eq!(
            decode_str("0123456789ABCDEFGHJKMNPQR$", DecodeMode::Strict),
            Err(Error::InvalidCharacter { index: 25 })
        );
        assert_eq!(
            decode_str("01234U6789ABCDEFGHJKMNPQR$", DecodeMode::Strict),
            Err(Error::InvalidCharacter { index: 5 })
        );
        assert_eq!(
            decode_str("80000000000000000000000000", DecodeMode::Crockford),
            Err(Error::InvalidCharacter { index: 0 })
        );
    }

    #[test]
    fn test_canonicalize_in_place() {
        let mut buffer = *b"0abcdefghijklmnopqrstvwxyz"; // cspell:disable-line
        assert_eq!(canonicalize(&mut buffer), Ok("0ABCDEFGH1JK1MN0PQRSTVWXYZ")); // cspell:disable-line

        let mut buffer = *b"0000000000000000000000000u";
        assert_eq!(canonicalize(&mut buffer), Err(Error::InvalidCharacter { index: 25 }));
    }
}
