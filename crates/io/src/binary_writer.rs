use crate::{IoError, IoResult};

/// Appends little-endian binary data to an owned buffer.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    inner: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.inner
    }

    pub fn write_bool(&mut self, value: bool) {
        self.inner.push(value as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.inner.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32_big_endian(&mut self, value: i32) {
        self.inner.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.inner.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, buffer: &[u8]) {
        self.inner.extend_from_slice(buffer);
    }

    pub fn write_var_int(&mut self, value: u64) {
        if value < 0xFD {
            self.write_u8(value as u8);
        } else if value <= 0xFFFF {
            self.write_u8(0xFD);
            self.write_u16(value as u16);
        } else if value <= 0xFFFF_FFFF {
            self.write_u8(0xFE);
            self.write_u32(value as u32);
        } else {
            self.write_u8(0xFF);
            self.write_u64(value);
        }
    }

    pub fn write_var_bytes(&mut self, value: &[u8]) {
        self.write_var_int(value.len() as u64);
        self.write_bytes(value);
    }

    pub fn write_var_string(&mut self, value: &str) {
        self.write_var_bytes(value.as_bytes());
    }

    /// Writes `value` zero-padded to exactly `length` bytes.
    pub fn write_fixed_string(&mut self, value: &str, length: usize) -> IoResult<()> {
        let bytes = value.as_bytes();
        if bytes.len() > length {
            return Err(IoError::invalid_data(format!(
                "string of {} bytes does not fit in {} bytes",
                bytes.len(),
                length
            )));
        }
        self.write_bytes(bytes);
        self.inner.resize(self.inner.len() + length - bytes.len(), 0);
        Ok(())
    }
}
