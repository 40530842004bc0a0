//! The NEF container for compiled contracts.
//!
//! ```text
//! +------------+-----------+------------------------------------------------------------+
//! |   Field    |  Length   |                          Comment                           |
//! +------------+-----------+------------------------------------------------------------+
//! | Magic      | 4 bytes   | Magic header                                               |
//! | Compiler   | 64 bytes  | Compiler name and version                                  |
//! | Source     | Var bytes | The url of the source files                                |
//! | Reserve    | 1 byte    | Reserved for future extensions. Must be 0.                 |
//! | Tokens     | Var array | Method tokens.                                             |
//! | Reserve    | 2 bytes   | Reserved for future extensions. Must be 0.                 |
//! | Script     | Var bytes | Contract script                                            |
//! | Checksum   | 4 bytes   | First four bytes of double SHA256 hash of the header       |
//! +------------+-----------+------------------------------------------------------------+
//! ```

use crate::method_token::MethodToken;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use neo_core::crypto;
use neo_io::{helper, BinaryWriter, IoError, IoResult, MemoryReader, Serializable, SerializableExt};
use neo_vm::ExecutionEngineLimits;
use serde_json::{json, Value};

/// A compiled contract: script, method tokens and integrity checksum.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NefFile {
    pub compiler: String,
    pub source: String,
    pub tokens: Vec<MethodToken>,
    pub script: Vec<u8>,
    pub checksum: u32,
}

impl NefFile {
    pub const MAGIC: u32 = 0x3346454E;

    /// Width of the compiler field.
    pub const COMPILER_LENGTH: usize = 64;

    pub const MAX_SOURCE_LENGTH: usize = 256;

    pub const MAX_TOKENS: usize = 128;

    const HEADER_SIZE: usize = std::mem::size_of::<u32>() + Self::COMPILER_LENGTH;

    /// Builds a NEF and fills in its checksum.
    pub fn new(compiler: &str, source: &str, tokens: Vec<MethodToken>, script: Vec<u8>) -> IoResult<Self> {
        let mut nef = Self {
            compiler: compiler.to_string(),
            source: source.to_string(),
            tokens,
            script,
            checksum: 0,
        };
        nef.checksum = Self::compute_checksum(&nef)?;
        Ok(nef)
    }

    /// Parses a NEF, verifying its checksum and size.
    pub fn parse(data: &[u8]) -> IoResult<Self> {
        let mut reader = MemoryReader::new(data);
        let nef = Self::deserialize(&mut reader)?;
        if nef.checksum != Self::compute_checksum(&nef)? {
            return Err(IoError::invalid_data("NEF checksum verification failed"));
        }
        let max = ExecutionEngineLimits::default().max_item_size as usize;
        if reader.position() > max {
            return Err(IoError::ExceedsMaximum {
                value: reader.position() as u64,
                max: max as u64,
            });
        }
        Ok(nef)
    }

    /// First four bytes, little-endian, of the double SHA-256 of everything
    /// before the checksum field.
    pub fn compute_checksum(file: &NefFile) -> IoResult<u32> {
        let bytes = file.to_array()?;
        let body = &bytes[..bytes.len() - std::mem::size_of::<u32>()];
        Ok(crypto::checksum(body))
    }

    pub fn to_json(&self) -> Value {
        json!({
            "magic": Self::MAGIC,
            "compiler": self.compiler,
            "source": self.source,
            "tokens": self.tokens.iter().map(MethodToken::to_json).collect::<Vec<_>>(),
            "script": STANDARD.encode(&self.script),
            "checksum": self.checksum,
        })
    }
}

impl Serializable for NefFile {
    fn size(&self) -> usize {
        Self::HEADER_SIZE
            + neo_io::var_bytes_size(self.source.len())
            + 1
            + helper::array_size(&self.tokens)
            + 2
            + neo_io::var_bytes_size(self.script.len())
            + std::mem::size_of::<u32>()
    }

    fn serialize(&self, writer: &mut BinaryWriter) -> IoResult<()> {
        writer.write_u32(Self::MAGIC);
        writer.write_fixed_string(&self.compiler, Self::COMPILER_LENGTH)?;
        writer.write_var_string(&self.source);
        writer.write_u8(0);
        helper::serialize_array(&self.tokens, writer)?;
        writer.write_u16(0);
        writer.write_var_bytes(&self.script);
        writer.write_u32(self.checksum);
        Ok(())
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        if reader.read_u32()? != Self::MAGIC {
            return Err(IoError::invalid_data("wrong NEF magic"));
        }
        let compiler = reader.read_fixed_string(Self::COMPILER_LENGTH)?;
        let source = reader.read_var_string(Self::MAX_SOURCE_LENGTH)?;
        if reader.read_u8()? != 0 {
            return Err(IoError::invalid_data("reserved byte must be 0"));
        }
        let tokens = helper::deserialize_array(reader, Self::MAX_TOKENS)?;
        if reader.read_u16()? != 0 {
            return Err(IoError::invalid_data("reserved bytes must be 0"));
        }
        let script =
            reader.read_var_bytes(ExecutionEngineLimits::default().max_item_size as usize)?;
        if script.is_empty() {
            return Err(IoError::invalid_data("script can't be empty"));
        }
        let checksum = reader.read_u32()?;
        Ok(Self {
            compiler,
            source,
            tokens,
            script,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_core::UInt160;
    use neo_vm::CallFlags;

    fn sample() -> NefFile {
        NefFile::new(
            "neon-test",
            "https://example.invalid/src",
            vec![MethodToken {
                hash: UInt160::zero(),
                method: "balanceOf".to_string(),
                parameters_count: 1,
                has_return_value: true,
                call_flags: CallFlags::READ_STATES,
            }],
            vec![0x11, 0x40],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_roundtrip() {
        let nef = sample();
        let bytes = nef.to_array().unwrap();
        assert_eq!(bytes.len(), nef.size());
        assert_eq!(&bytes[..4], &NefFile::MAGIC.to_le_bytes());
        assert_eq!(NefFile::parse(&bytes).unwrap(), nef);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut nef = sample();
        nef.checksum ^= 1;
        assert!(NefFile::parse(&nef.to_array().unwrap()).is_err());
    }

    #[test]
    fn test_empty_script_rejected() {
        let nef = NefFile::new("c", "", vec![], vec![]).unwrap();
        assert!(NefFile::parse(&nef.to_array().unwrap()).is_err());
    }

    #[test]
    fn test_reserved_byte_must_be_zero() {
        let nef = NefFile::new("c", "", vec![], vec![0x40]).unwrap();
        let mut bytes = nef.to_array().unwrap();
        bytes[NefFile::HEADER_SIZE + 1] = 1;
        assert!(NefFile::parse(&bytes).is_err());
    }

    #[test]
    fn test_json() {
        let json = sample().to_json();
        assert_eq!(json["magic"], 860243278u32);
        assert_eq!(json["script"], "EUA=");
    }
}
