//! nom parsers for the primitive building blocks of the IconVG byte
//! stream: the magic identifier and the four variable-length number
//! families.
//!
//! All four families share one length-prefix convention, read from the
//! low bits of the first byte:
//!
//! - bit 0 clear: 1-byte encoding, raw value `v >> 1` (0..=127);
//! - bit 0 set, bit 1 clear: 2-byte encoding, raw value
//!   `u16_le >> 2` (0..=16383);
//! - both bits set: 4-byte encoding, raw value `u32_le & !3`.
//!
//! The families differ only in how they interpret the raw value.

use nom::{
    bytes::complete::tag,
    combinator::{map, peek},
    number::complete::{le_u16, le_u32, le_u8},
    IResult,
};

/// The four magic bytes every IconVG file begins with: 0x89 "IVG".
pub const MAGIC: [u8; 4] = [0x89, 0x49, 0x56, 0x47];

/// Recognizes the magic identifier.
pub fn magic_identifier(input: &[u8]) -> IResult<&[u8], ()> {
    map(tag(&MAGIC[..]), |_| ())(input)
}

/// Parses a natural number (an unsigned 32-bit integer).
pub fn natural_number(input: &[u8]) -> IResult<&[u8], u32> {
    let (_, v) = peek(le_u8)(input)?;
    if v & 0x01 == 0 {
        map(le_u8, |v| u32::from(v >> 1))(input)
    } else if v & 0x02 == 0 {
        map(le_u16, |v| u32::from(v >> 2))(input)
    } else {
        map(le_u32, |v| v >> 2)(input)
    }
}

/// Parses a coordinate number.
///
/// The 1-byte encoding covers the integers -64..=63; the 2-byte encoding
/// covers -128..=128 minus one 64th, in increments of a 64th; the 4-byte
/// encoding is an IEEE 754 value with the low two mantissa bits cleared.
pub fn coordinate_number(input: &[u8]) -> IResult<&[u8], f32> {
    let (_, v) = peek(le_u8)(input)?;
    if v & 0x01 == 0 {
        map(le_u8, |v| (i32::from(v >> 1) - 64) as f32)(input)
    } else if v & 0x02 == 0 {
        map(le_u16, |v| {
            (i32::from(v >> 2) - (128 * 64)) as f32 / 64.0
        })(input)
    } else {
        map(le_u32, |v| f32::from_bits(v & 0xFFFF_FFFC))(input)
    }
}

/// Parses a real number. The short encodings cover the naturals they can
/// express; the 4-byte encoding is the same bit-reinterpretation as for
/// coordinates.
pub fn real_number(input: &[u8]) -> IResult<&[u8], f32> {
    let (_, v) = peek(le_u8)(input)?;
    if v & 0x01 == 0 {
        map(le_u8, |v| f32::from(v >> 1))(input)
    } else if v & 0x02 == 0 {
        map(le_u16, |v| f32::from(v >> 2))(input)
    } else {
        map(le_u32, |v| f32::from_bits(v & 0xFFFF_FFFC))(input)
    }
}

/// Parses a zero-to-one number: the short encodings divide the raw value
/// by 120 or 15120, both highly composite, so that common fractions are
/// exact.
pub fn zero_to_one_number(input: &[u8]) -> IResult<&[u8], f32> {
    let (_, v) = peek(le_u8)(input)?;
    if v & 0x01 == 0 {
        map(le_u8, |v| (f64::from(v >> 1) / 120.0) as f32)(input)
    } else if v & 0x02 == 0 {
        map(le_u16, |v| (f64::from(v >> 2) / 15120.0) as f32)(input)
    } else {
        map(le_u32, |v| f32::from_bits(v & 0xFFFF_FFFC))(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok<T>(r: IResult<&[u8], T>) -> (usize, T) {
        let (rest, v) = r.unwrap();
        (rest.len(), v)
    }

    #[test]
    fn magic() {
        assert!(magic_identifier(&[0x89, 0x49, 0x56, 0x47, 0x00]).is_ok());
        assert!(magic_identifier(&[0x89, 0x49, 0x56, 0x00]).is_err());
        assert!(magic_identifier(&[0x89, 0x49]).is_err());
    }

    #[test]
    fn one_byte_encodings() {
        for raw in 0..128u32 {
            let buf = [(raw << 1) as u8, 0xAA];
            assert_eq!(ok(natural_number(&buf)), (1, raw));
            assert_eq!(ok(coordinate_number(&buf)), (1, raw as f32 - 64.0));
            assert_eq!(ok(real_number(&buf)), (1, raw as f32));
            assert_eq!(
                ok(zero_to_one_number(&buf)),
                (1, (f64::from(raw) / 120.0) as f32)
            );
        }
    }

    #[test]
    fn two_byte_encodings() {
        let encode = |raw: u16| ((raw << 2) | 0x01).to_le_bytes();

        assert_eq!(ok(natural_number(&encode(0))), (0, 0));
        assert_eq!(ok(natural_number(&encode(16383))), (0, 16383));

        // Coordinates are biased by 128 * 64 and scaled down by 64.
        assert_eq!(ok(coordinate_number(&encode(0))), (0, -128.0));
        assert_eq!(ok(coordinate_number(&encode(128 * 64))), (0, 0.0));
        assert_eq!(ok(coordinate_number(&encode(128 * 64 + 32))), (0, 0.5));
        assert_eq!(ok(coordinate_number(&encode(16383))), (0, 8191.0 / 64.0));

        assert_eq!(ok(real_number(&encode(16383))), (0, 16383.0));

        assert_eq!(ok(zero_to_one_number(&encode(15120))), (0, 1.0));
        assert_eq!(ok(zero_to_one_number(&encode(7560))), (0, 0.5));
    }

    #[test]
    fn four_byte_encodings() {
        let encode = |bits: u32| (bits | 0x03).to_le_bytes();

        assert_eq!(ok(natural_number(&encode(0xFFFF_FFFC))), (0, 0x3FFF_FFFF));

        // The low two bits are cleared before reinterpreting, so any f32
        // whose mantissa has two trailing zero bits survives exactly.
        assert_eq!(ok(coordinate_number(&encode(1.5f32.to_bits()))), (0, 1.5));
        assert_eq!(
            ok(coordinate_number(&encode((-123.25f32).to_bits()))),
            (0, -123.25)
        );
        assert_eq!(ok(real_number(&encode(1e9f32.to_bits()))), (0, 1e9));
        assert_eq!(
            ok(zero_to_one_number(&encode(0.75f32.to_bits()))),
            (0, 0.75)
        );
    }

    #[test]
    fn not_enough_bytes() {
        assert!(natural_number(&[]).is_err());
        assert!(natural_number(&[0x01]).is_err());
        assert!(natural_number(&[0x03, 0x00, 0x00]).is_err());
        assert!(coordinate_number(&[0x01]).is_err());
        assert!(real_number(&[0x03]).is_err());
        assert!(zero_to_one_number(&[0x03, 0xFF]).is_err());
    }
}
