//! Packed BCD numerics
//!
//! CI-V carries every number as packed binary-coded decimal, two digits per
//! byte. Two digit orders are in use on the wire:
//!
//! - [`Endianness::Little`]: least-significant digit pair first. Used for
//!   frequencies, repeater offsets and RIT offsets.
//!   `14_250_000` Hz in 5 bytes is `00 00 25 14 00`.
//! - [`Endianness::Big`]: digits in reading order. Used for levels, tones,
//!   memory channels. Level `128` in 2 bytes is `01 28`.
//!
//! An odd nibble count leaves the most significant nibble of the field unused;
//! it is written as zero and ignored on decode.
//!
//! The codec is sign-agnostic. Signed fields carry a separate sign byte that
//! callers compose themselves.

use crate::error::ParseError;

/// Digit order of a BCD field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianness {
    /// Least-significant digit pair in the first byte
    Little,
    /// Most-significant digit pair in the first byte
    Big,
}

/// Number of bytes needed to hold `nibbles` digits
pub const fn bcd_len(nibbles: usize) -> usize {
    nibbles.div_ceil(2)
}

/// Largest value representable in `nibbles` digits, or `None` past `u64`
fn max_value(nibbles: usize) -> Option<u64> {
    10u64.checked_pow(nibbles as u32).map(|limit| limit - 1)
}

/// Encode `value` as packed BCD across `nibbles` digits.
///
/// Fails with [`ParseError::BcdOverflow`] when the value needs more digits
/// than requested; the value is never truncated.
pub fn encode_bcd(value: u64, nibbles: usize, order: Endianness) -> Result<Vec<u8>, ParseError> {
    let fits = match max_value(nibbles) {
        Some(max) => value <= max,
        None => true,
    };
    if !fits {
        return Err(ParseError::BcdOverflow {
            value,
            digits: nibbles,
        });
    }

    // Build little-endian first, digit pairs from the least significant end
    let len = bcd_len(nibbles);
    let mut out = Vec::with_capacity(len);
    let mut remaining = value;
    for _ in 0..len {
        let lo = (remaining % 10) as u8;
        remaining /= 10;
        let hi = (remaining % 10) as u8;
        remaining /= 10;
        out.push((hi << 4) | lo);
    }

    if nibbles % 2 == 1 {
        if let Some(top) = out.last_mut() {
            *top &= 0x0F;
        }
    }

    if order == Endianness::Big {
        out.reverse();
    }
    Ok(out)
}

/// Decode `nibbles` digits of packed BCD from `bytes`.
///
/// Extra trailing bytes beyond the field are ignored. A nibble of 10-15
/// fails with [`ParseError::InvalidBcd`].
pub fn decode_bcd(bytes: &[u8], nibbles: usize, order: Endianness) -> Result<u64, ParseError> {
    let len = bcd_len(nibbles);
    if bytes.len() < len {
        return Err(ParseError::BcdTooShort {
            needed: len,
            actual: bytes.len(),
        });
    }
    let field = &bytes[..len];
    let odd = nibbles % 2 == 1;

    let mut value: u64 = 0;
    // Walk from the most significant byte
    for i in 0..len {
        let byte = match order {
            Endianness::Little => field[len - 1 - i],
            Endianness::Big => field[i],
        };
        let hi = byte >> 4;
        let lo = byte & 0x0F;

        if !(odd && i == 0) {
            if hi > 9 {
                return Err(ParseError::InvalidBcd(byte));
            }
            value = value.saturating_mul(10).saturating_add(u64::from(hi));
        }
        if lo > 9 {
            return Err(ParseError::InvalidBcd(byte));
        }
        value = value.saturating_mul(10).saturating_add(u64::from(lo));
    }
    Ok(value)
}

/// Encode a frequency in Hz as a little-endian BCD field of `width` bytes
pub fn frequency_to_bcd(hz: u64, width: usize) -> Result<Vec<u8>, ParseError> {
    encode_bcd(hz, width * 2, Endianness::Little)
}

/// Decode a little-endian BCD frequency field spanning all of `bytes`
pub fn bcd_to_frequency(bytes: &[u8]) -> Result<u64, ParseError> {
    decode_bcd(bytes, bytes.len() * 2, Endianness::Little)
}

/// Encode a single byte as two BCD digits (`25` -> `0x25`)
pub fn to_bcd_byte(value: u8) -> Result<u8, ParseError> {
    let bytes = encode_bcd(u64::from(value), 2, Endianness::Big)?;
    Ok(bytes[0])
}

/// Decode a single two-digit BCD byte (`0x25` -> `25`)
pub fn from_bcd_byte(byte: u8) -> Result<u8, ParseError> {
    decode_bcd(&[byte], 2, Endianness::Big).map(|v| v as u8)
}
