use crate::{IoError, IoResult};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::mem::size_of;

/// A forward-only reader over a borrowed byte slice.
pub struct MemoryReader<'a> {
    memory: &'a [u8],
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(memory: &'a [u8]) -> Self {
        Self { memory, pos: 0 }
    }

    #[inline(always)]
    fn ensure_position(&self, move_by: usize) -> IoResult<()> {
        match self.pos.checked_add(move_by) {
            Some(end) if end <= self.memory.len() => Ok(()),
            _ => Err(IoError::EndOfStream),
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes not yet consumed.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.memory.len() - self.pos
    }

    #[inline(always)]
    pub fn peek(&self) -> IoResult<u8> {
        self.ensure_position(1)?;
        Ok(self.memory[self.pos])
    }

    pub fn read_bool(&mut self) -> IoResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(IoError::invalid_data("Invalid boolean value")),
        }
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> IoResult<u8> {
        self.ensure_position(1)?;
        let value = self.memory[self.pos];
        self.pos += 1;
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u16(&mut self) -> IoResult<u16> {
        self.ensure_position(size_of::<u16>())?;
        let value = LittleEndian::read_u16(&self.memory[self.pos..]);
        self.pos += size_of::<u16>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i32(&mut self) -> IoResult<i32> {
        self.ensure_position(size_of::<i32>())?;
        let value = LittleEndian::read_i32(&self.memory[self.pos..]);
        self.pos += size_of::<i32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i32_big_endian(&mut self) -> IoResult<i32> {
        self.ensure_position(size_of::<i32>())?;
        let value = BigEndian::read_i32(&self.memory[self.pos..]);
        self.pos += size_of::<i32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> IoResult<u32> {
        self.ensure_position(size_of::<u32>())?;
        let value = LittleEndian::read_u32(&self.memory[self.pos..]);
        self.pos += size_of::<u32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u64(&mut self) -> IoResult<u64> {
        self.ensure_position(size_of::<u64>())?;
        let value = LittleEndian::read_u64(&self.memory[self.pos..]);
        self.pos += size_of::<u64>();
        Ok(value)
    }

    /// Reads a variable-length integer and rejects values above `max`.
    pub fn read_var_int(&mut self, max: u64) -> IoResult<u64> {
        let b = self.read_u8()?;
        let value = match b {
            0xfd => self.read_u16()? as u64,
            0xfe => self.read_u32()? as u64,
            0xff => self.read_u64()?,
            _ => b as u64,
        };
        if value > max {
            return Err(IoError::ExceedsMaximum { value, max });
        }
        Ok(value)
    }

    /// Reads a zero-padded string occupying exactly `length` bytes.
    pub fn read_fixed_string(&mut self, length: usize) -> IoResult<String> {
        self.ensure_position(length)?;
        let end = self.pos + length;
        let field = &self.memory[self.pos..end];
        let text_len = field.iter().position(|b| *b == 0).unwrap_or(length);
        if field[text_len..].iter().any(|b| *b != 0) {
            return Err(IoError::invalid_data("Invalid fixed string format"));
        }
        let text = std::str::from_utf8(&field[..text_len])
            .map_err(|_| IoError::invalid_data("Invalid UTF-8 sequence"))?
            .to_string();
        self.pos = end;
        Ok(text)
    }

    pub fn read_var_string(&mut self, max: usize) -> IoResult<String> {
        let data = self.read_var_memory(max)?;
        String::from_utf8(data.to_vec()).map_err(|_| IoError::invalid_data("Invalid UTF-8 sequence"))
    }

    #[inline(always)]
    pub fn read_memory(&mut self, count: usize) -> IoResult<&'a [u8]> {
        self.ensure_position(count)?;
        let result = &self.memory[self.pos..self.pos + count];
        self.pos += count;
        Ok(result)
    }

    #[inline(always)]
    pub fn read_var_memory(&mut self, max: usize) -> IoResult<&'a [u8]> {
        let length = self.read_var_int(max as u64)? as usize;
        self.read_memory(length)
    }

    pub fn read_var_bytes(&mut self, max: usize) -> IoResult<Vec<u8>> {
        Ok(self.read_var_memory(max)?.to_vec())
    }

    #[inline(always)]
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let result = &self.memory[self.pos..];
        self.pos = self.memory.len();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_var_int_widths() {
        let data = [0xfc, 0xfd, 0x34, 0x12, 0xfe, 0x78, 0x56, 0x34, 0x12];
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0xfc);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0x1234);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0x12345678);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_var_int_respects_max() {
        let mut reader = MemoryReader::new(&[0x10]);
        assert_eq!(
            reader.read_var_int(0x0f),
            Err(IoError::ExceedsMaximum { value: 0x10, max: 0x0f })
        );
    }

    #[test]
    fn test_read_fixed_string_rejects_garbage_padding() {
        let mut data = b"abc".to_vec();
        data.extend_from_slice(&[0, 0, 1, 0]);
        let mut reader = MemoryReader::new(&data);
        assert!(reader.read_fixed_string(7).is_err());

        let mut data = b"abc".to_vec();
        data.extend_from_slice(&[0; 4]);
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read_fixed_string(7).unwrap(), "abc");
        assert_eq!(reader.position(), 7);
    }

    #[test]
    fn test_short_input_is_end_of_stream() {
        let mut reader = MemoryReader::new(&[1, 2]);
        assert_eq!(reader.read_u32(), Err(IoError::EndOfStream));
        assert_eq!(reader.read_memory(3), Err(IoError::EndOfStream));
    }

    #[test]
    fn test_read_big_endian() {
        let mut reader = MemoryReader::new(&[0, 0, 0, 5]);
        assert_eq!(reader.read_i32_big_endian().unwrap(), 5);
    }
}
