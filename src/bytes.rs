use anyhow::{Context, Result};
use std::io::{Cursor, Read};

pub fn extract_u8_bits_into_tup(byte: u8) -> (u8, u8, u8, u8, u8, u8, u8, u8) {
    (
        byte >> 7 & 1,
        byte >> 6 & 1,
        byte >> 5 & 1,
        byte >> 4 & 1,
        byte >> 3 & 1,
        byte >> 2 & 1,
        byte >> 1 & 1,
        byte & 1,
    )
}

/// Splits off a cursor limited to the next `size` bytes, so a record parser
/// can never run past its own record. The parent cursor advances past the
/// window.
pub trait TakeExact<'a> {
    fn take_exact(&mut self, size: usize) -> Result<Cursor<&'a [u8]>>;
}
impl<'a> TakeExact<'a> for Cursor<&'a [u8]> {
    fn take_exact(&mut self, size: usize) -> Result<Cursor<&'a [u8]>> {
        let data: &'a [u8] = *self.get_ref();
        let start = self.position() as usize;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= data.len())
            .with_context(|| format!("Failed to take {} bytes from cursor", size))?;
        self.set_position(end as u64);
        Ok(Cursor::new(&data[start..end]))
    }
}

/// Remaining bytes in a cursor window.
pub fn bytes_left(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

/// Decodes `size` bytes of packed BCD into a decimal number.
/// A nibble above 9 makes the value unrepresentable and is rejected.
pub fn read_bcd(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<u32> {
    let mut buffer = vec![0u8; size];
    cursor
        .read_exact(&mut buffer)
        .context("Failed to read BCD value")?;
    let mut value: u32 = 0;
    for byte in buffer {
        let hi = byte >> 4;
        let lo = byte & 0x0F;
        if hi > 9 || lo > 9 {
            anyhow::bail!("Invalid BCD nibble in byte {:#04x}", byte);
        }
        value = value * 100 + (hi as u32) * 10 + lo as u32;
    }
    Ok(value)
}

/// Encodes a decimal number as `size` bytes of packed BCD, most significant
/// digits first. Values that do not fit in 2 × size digits are rejected.
pub fn write_bcd(out: &mut Vec<u8>, mut value: u32, size: usize) -> Result<()> {
    let mut buffer = vec![0u8; size];
    for slot in buffer.iter_mut().rev() {
        let lo = (value % 10) as u8;
        value /= 10;
        let hi = (value % 10) as u8;
        value /= 10;
        *slot = hi << 4 | lo;
    }
    if value != 0 {
        anyhow::bail!("Value does not fit in {} BCD bytes", size);
    }
    out.extend_from_slice(&buffer);
    Ok(())
}

pub fn write_u16_be(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u32_be(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_round_trip() {
        let mut out = Vec::new();
        write_bcd(&mut out, 2024, 2).unwrap();
        assert_eq!(out, vec![0x20, 0x24]);
        let mut cursor = Cursor::new(out.as_slice());
        assert_eq!(read_bcd(&mut cursor, 2).unwrap(), 2024);
    }

    #[test]
    fn bcd_rejects_hex_nibbles() {
        let bytes = [0x2A, 0x01];
        let mut cursor = Cursor::new(bytes.as_slice());
        assert!(read_bcd(&mut cursor, 2).is_err());
    }

    #[test]
    fn bcd_rejects_overflow() {
        let mut out = Vec::new();
        assert!(write_bcd(&mut out, 12345, 2).is_err());
    }

    #[test]
    fn take_exact_limits_window() {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut cursor = Cursor::new(bytes.as_slice());
        let mut inner = cursor.take_exact(3).unwrap();
        let mut buffer = [0u8; 3];
        inner.read_exact(&mut buffer).unwrap();
        assert_eq!(buffer, [1, 2, 3]);
        assert!(inner.read_exact(&mut [0u8; 1]).is_err());
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn bit_tuple_order_is_msb_first() {
        assert_eq!(
            extract_u8_bits_into_tup(0b1010_0001),
            (1, 0, 1, 0, 0, 0, 0, 1)
        );
    }
}
