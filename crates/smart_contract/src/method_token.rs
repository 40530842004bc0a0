use neo_core::UInt160;
use neo_io::{BinaryWriter, IoError, IoResult, MemoryReader, Serializable};
use neo_vm::CallFlags;
use serde_json::{json, Value};

/// A static call to another contract, declared in the NEF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodToken {
    pub hash: UInt160,
    pub method: String,
    pub parameters_count: u16,
    pub has_return_value: bool,
    pub call_flags: CallFlags,
}

impl MethodToken {
    /// Maximum length of the method name in bytes.
    pub const MAX_METHOD_LENGTH: usize = 32;

    pub fn to_json(&self) -> Value {
        json!({
            "hash": self.hash.to_string(),
            "method": self.method,
            "paramcount": self.parameters_count,
            "hasreturnvalue": self.has_return_value,
            "callflags": self.call_flags.bits(),
        })
    }
}

impl Serializable for MethodToken {
    fn size(&self) -> usize {
        UInt160::LENGTH
            + neo_io::var_bytes_size(self.method.len())
            + std::mem::size_of::<u16>()
            + 1
            + 1
    }

    fn serialize(&self, writer: &mut BinaryWriter) -> IoResult<()> {
        self.hash.serialize(writer)?;
        writer.write_var_string(&self.method);
        writer.write_u16(self.parameters_count);
        writer.write_bool(self.has_return_value);
        writer.write_u8(self.call_flags.bits());
        Ok(())
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let hash = UInt160::deserialize(reader)?;
        let method = reader.read_var_string(Self::MAX_METHOD_LENGTH)?;
        if method.starts_with('_') {
            return Err(IoError::invalid_data(format!(
                "method token cannot target {method}"
            )));
        }
        let parameters_count = reader.read_u16()?;
        let has_return_value = reader.read_bool()?;
        let flags = reader.read_u8()?;
        let call_flags = CallFlags::from_byte(flags)
            .ok_or_else(|| IoError::invalid_data(format!("invalid call flags: {flags:#04x}")))?;
        Ok(Self {
            hash,
            method,
            parameters_count,
            has_return_value,
            call_flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_io::SerializableExt;

    fn token() -> MethodToken {
        MethodToken {
            hash: UInt160::from([1u8; 20]),
            method: "transfer".to_string(),
            parameters_count: 4,
            has_return_value: true,
            call_flags: CallFlags::ALL,
        }
    }

    #[test]
    fn test_roundtrip() {
        let bytes = token().to_array().unwrap();
        assert_eq!(bytes.len(), token().size());
        assert_eq!(MethodToken::from_array(&bytes).unwrap(), token());
    }

    #[test]
    fn test_rejects_private_methods_and_bad_flags() {
        let mut private = token();
        private.method = "_deploy".to_string();
        assert!(MethodToken::from_array(&private.to_array().unwrap()).is_err());

        let mut bytes = token().to_array().unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 0x10;
        assert!(MethodToken::from_array(&bytes).is_err());
    }
}
