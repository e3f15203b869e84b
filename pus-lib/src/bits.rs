//! Extraction of unsigned integer fields that are not byte aligned.
//!
//! Bits are numbered MSB-first within each byte, and fields are read big-endian, which is
//! the bit order used by every PUS and CCSDS header.
use crate::{Error, Result};

/// Widest field supported by [extract] and [extract_uint].
pub const MAX_FIELD_BITS: usize = 64;

/// Extract `bit_count` bits starting `bit_offset` bits into `buf[byte_offset]`.
///
/// The value is returned right-aligned as the minimal number of big-endian bytes, i.e.,
/// `ceil(bit_count / 8)` bytes, left padded with zero bits.
///
/// # Errors
/// [Error::InvalidBitField] if `bit_offset >= 8`, `bit_count == 0`, or `bit_count` is wider
/// than [MAX_FIELD_BITS]. [Error::InsufficientData] if `buf` does not contain all the bytes
/// covering the field.
///
/// # Example
/// ```
/// let buf = [0b1010_1100, 0b0101_0000];
/// // 6 bits starting at bit 4 of the first byte: 1100 01
/// assert_eq!(pus::bits::extract(&buf, 6, 0, 4).unwrap(), vec![0b11_0001]);
/// ```
pub fn extract(
    buf: &[u8],
    bit_count: usize,
    byte_offset: usize,
    bit_offset: usize,
) -> Result<Vec<u8>> {
    let value = extract_uint(buf, bit_count, byte_offset, bit_offset)?;
    let num_bytes = bit_count.div_ceil(8);
    Ok(value.to_be_bytes()[8 - num_bytes..].to_vec())
}

/// Same as [extract], but returns the field as an integer.
///
/// # Errors
/// See [extract].
pub fn extract_uint(
    buf: &[u8],
    bit_count: usize,
    byte_offset: usize,
    bit_offset: usize,
) -> Result<u64> {
    if bit_offset >= 8 || bit_count == 0 || bit_count > MAX_FIELD_BITS {
        return Err(Error::InvalidBitField {
            bit_count,
            bit_offset,
        });
    }
    let needed = (bit_offset + bit_count).div_ceil(8);
    let available = buf.len().saturating_sub(byte_offset);
    if available < needed {
        return Err(Error::InsufficientData {
            actual: (available * 8).saturating_sub(bit_offset),
            minimum: bit_count,
        });
    }

    // At most 9 bytes for a 64-bit field with a 7 bit offset, so this can't overflow.
    let register = buf[byte_offset..byte_offset + needed]
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
    let shift = needed * 8 - bit_offset - bit_count;
    let mask = (1u128 << bit_count) - 1;

    #[allow(clippy::cast_possible_truncation)]
    Ok(((register >> shift) & mask) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(8, 0, 0, &[0xab]; "whole first byte")]
    #[test_case(16, 0, 0, &[0xab, 0xcd]; "first two bytes")]
    #[test_case(4, 0, 0, &[0x0a]; "high nibble")]
    #[test_case(4, 0, 4, &[0x0b]; "low nibble")]
    #[test_case(8, 0, 4, &[0xbc]; "straddles a byte boundary")]
    #[test_case(11, 0, 5, &[0x03, 0xcd]; "apid shaped field")]
    #[test_case(1, 2, 7, &[0x01]; "single trailing bit")]
    #[test_case(24, 1, 0, &[0xcd, 0xef, 0x01]; "three bytes at an offset")]
    fn extract_fields(bits: usize, byte_offset: usize, bit_offset: usize, expected: &[u8]) {
        let buf = [0xab, 0xcd, 0xef, 0x01];
        let got = extract(&buf, bits, byte_offset, bit_offset).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn extract_wide_field() {
        let buf = [0xff, 1, 2, 3, 4, 5, 6, 7, 8, 0x80];
        let got = extract(&buf, 64, 0, 1).unwrap();
        assert_eq!(got, vec![0xfe, 0x02, 0x04, 0x06, 0x08, 0x0a, 0x0c, 0x0e]);
        assert_eq!(extract_uint(&buf, 40, 1, 0).unwrap(), 0x01_0203_0405);
    }

    #[test]
    fn output_is_left_padded() {
        let buf = [0xff, 0xff, 0xff];
        assert_eq!(extract(&buf, 9, 0, 3).unwrap(), vec![0x01, 0xff]);
        assert_eq!(extract(&buf, 17, 0, 0).unwrap(), vec![0x01, 0xff, 0xff]);
    }

    #[test]
    fn not_enough_bytes() {
        let buf = [0xab, 0xcd];
        let err = extract(&buf, 16, 0, 1).unwrap_err();
        assert!(
            matches!(
                err,
                Error::InsufficientData {
                    actual: 15,
                    minimum: 16
                }
            ),
            "{err:?}"
        );
        assert!(extract(&buf, 8, 2, 0).is_err());
        assert!(extract(&buf, 8, 10, 0).is_err());
    }

    #[test]
    fn invalid_arguments() {
        let buf = [0u8; 16];
        assert!(matches!(
            extract(&buf, 0, 0, 0),
            Err(Error::InvalidBitField { .. })
        ));
        assert!(matches!(
            extract(&buf, 8, 0, 8),
            Err(Error::InvalidBitField { .. })
        ));
        assert!(matches!(
            extract(&buf, 65, 0, 0),
            Err(Error::InvalidBitField { .. })
        ));
    }
}
