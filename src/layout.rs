//! Wire layout for net indices.
//!
//! An index is written as a one-bit flag followed by one of two segments:
//!
//! ```text
//! ┌──────┬──────────────────────────────┐
//! │ flag │ payload                      │
//! ├──────┼──────────────────────────────┤
//! │  0   │ FirstSegmentBits bits        │  index < 2^FirstSegmentBits
//! │  1   │ TrueBitNum bits              │  any index, and the invalid index
//! └──────┴──────────────────────────────┘
//! ```
//!
//! Bits are packed least-significant first into bytes, and each value is
//! written least-significant bit first. Common tags get the smallest indices,
//! so most replicated tags take the short form.

use crate::error::WireError;
use crate::net_index::TagNetIndex;

/// Append-only bit buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitWriter {
    bytes: Vec<u8>,
    len_bits: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        let byte = self.len_bits / 8;
        if byte == self.bytes.len() {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[byte] |= 1 << (self.len_bits % 8);
        }
        self.len_bits += 1;
    }

    /// Write the low `count` bits of `value`, least significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32);
        for i in 0..count {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Number of bits written so far.
    #[inline]
    pub fn len_bits(&self) -> usize {
        self.len_bits
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads bits in the order [`BitWriter`] wrote them.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    len_bits: usize,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Read every bit of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_len(bytes, bytes.len() * 8)
    }

    /// Read only the first `len_bits` bits of `bytes`.
    pub fn with_len(bytes: &'a [u8], len_bits: usize) -> Self {
        Self {
            bytes,
            len_bits: len_bits.min(bytes.len() * 8),
            pos: 0,
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.len_bits - self.pos
    }

    pub fn read_bit(&mut self) -> Result<bool, WireError> {
        if self.pos >= self.len_bits {
            return Err(WireError::UnexpectedEof {
                needed: 1,
                remaining: 0,
            });
        }
        let bit = (self.bytes[self.pos / 8] >> (self.pos % 8)) & 1 == 1;
        self.pos += 1;
        Ok(bit)
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u32, WireError> {
        debug_assert!(count <= 32);
        if (count as usize) > self.remaining() {
            return Err(WireError::UnexpectedEof {
                needed: count as usize,
                remaining: self.remaining(),
            });
        }
        let mut value = 0u32;
        for i in 0..count {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }
}

/// The two-segment encoding derived from a net-index assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetIndexLayout {
    first_segment_bits: u8,
    true_bit_num: u8,
    invalid_index: TagNetIndex,
}

impl NetIndexLayout {
    /// `first_segment_bits` is clamped to `1..=true_bit_num`.
    pub fn new(first_segment_bits: u8, true_bit_num: u8, invalid_index: TagNetIndex) -> Self {
        let true_bit_num = true_bit_num.clamp(1, 16);
        Self {
            first_segment_bits: first_segment_bits.clamp(1, true_bit_num),
            true_bit_num,
            invalid_index,
        }
    }

    #[inline]
    pub fn first_segment_bits(&self) -> u8 {
        self.first_segment_bits
    }

    #[inline]
    pub fn true_bit_num(&self) -> u8 {
        self.true_bit_num
    }

    #[inline]
    pub fn invalid_index(&self) -> TagNetIndex {
        self.invalid_index
    }

    #[inline]
    fn fits_first_segment(&self, index: TagNetIndex) -> bool {
        index != self.invalid_index && u32::from(index) < (1u32 << self.first_segment_bits)
    }

    pub fn write_index(&self, writer: &mut BitWriter, index: TagNetIndex) {
        if self.fits_first_segment(index) {
            writer.write_bit(false);
            writer.write_bits(u32::from(index), self.first_segment_bits);
        } else {
            writer.write_bit(true);
            writer.write_bits(u32::from(index), self.true_bit_num);
        }
    }

    pub fn read_index(&self, reader: &mut BitReader<'_>) -> Result<TagNetIndex, WireError> {
        let bits = if reader.read_bit()? {
            self.true_bit_num
        } else {
            self.first_segment_bits
        };
        // at most 16 bits were read
        Ok(reader.read_bits(bits)? as TagNetIndex)
    }

    /// Bits [`write_index`](Self::write_index) spends on `index`, flag included.
    pub fn encoded_bits(&self, index: TagNetIndex) -> u32 {
        1 + if self.fits_first_segment(index) {
            u32::from(self.first_segment_bits)
        } else {
            u32::from(self.true_bit_num)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn bits_pack_lsb_first() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b10, 2);
        writer.write_bits(0b1_1111, 5);
        writer.write_bit(true);

        assert_eq!(writer.len_bits(), 9);
        assert_eq!(writer.as_bytes(), &[0b1111_1101, 0b1]);
    }

    #[test]
    fn reader_stops_at_bit_length() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        let len = writer.len_bits();
        let bytes = writer.into_bytes();

        let mut reader = BitReader::with_len(&bytes, len);
        assert_eq!(reader.read_bits(3), Ok(0b101));
        assert_eq!(
            reader.read_bit(),
            Err(WireError::UnexpectedEof {
                needed: 1,
                remaining: 0
            })
        );
    }

    #[test]
    fn reader_reports_short_reads() {
        let bytes = [0xff];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            reader.read_bits(9),
            Err(WireError::UnexpectedEof {
                needed: 9,
                remaining: 8
            })
        );
    }

    // 10 tags: invalid index 11, 4 bits wide; first segment of 2 bits.
    #[rstest]
    #[case(0, false, 3)]
    #[case(3, false, 3)]
    #[case(4, true, 5)]
    #[case(9, true, 5)]
    #[case(11, true, 5)]
    fn index_segments(#[case] index: TagNetIndex, #[case] long: bool, #[case] bits: u32) {
        let layout = NetIndexLayout::new(2, 4, 11);
        let mut writer = BitWriter::new();
        layout.write_index(&mut writer, index);

        assert_eq!(writer.len_bits() as u32, bits);
        assert_eq!(layout.encoded_bits(index), bits);

        let bytes = writer.as_bytes().to_vec();
        let mut reader = BitReader::with_len(&bytes, writer.len_bits());
        assert_eq!(reader.read_bit(), Ok(long));

        let mut reader = BitReader::with_len(&bytes, writer.len_bits());
        assert_eq!(layout.read_index(&mut reader), Ok(index));
    }

    #[test]
    fn invalid_index_always_long_form() {
        // the invalid index would fit the short segment numerically
        let layout = NetIndexLayout::new(4, 4, 3);
        let mut writer = BitWriter::new();
        layout.write_index(&mut writer, 3);
        assert_eq!(writer.len_bits(), 5);
        assert_eq!(writer.as_bytes()[0] & 1, 1);
    }

    #[test]
    fn first_segment_clamped_to_true_width() {
        let layout = NetIndexLayout::new(16, 5, 20);
        assert_eq!(layout.first_segment_bits(), 5);
        let layout = NetIndexLayout::new(0, 5, 20);
        assert_eq!(layout.first_segment_bits(), 1);
    }
}
