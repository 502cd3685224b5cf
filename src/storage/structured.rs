//! Checksummed structured readers and writers for index files.
//!
//! Every index file is a sequence of primitive values followed by a
//! CRC32 trailer. [`StructWriter::close`] appends the trailer and
//! [`StructReader::finish`] verifies it after all values were read.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{Result, TabulaError};
use crate::storage::{StorageInput, StorageOutput};

/// Writer for structured binary data with a CRC32 trailer.
pub struct StructWriter {
    output: Box<dyn StorageOutput>,
    hasher: Hasher,
    bytes_written: u64,
}

impl StructWriter {
    /// Create a new structured writer over a storage output.
    pub fn new(output: Box<dyn StorageOutput>) -> Self {
        StructWriter {
            output,
            hasher: Hasher::new(),
            bytes_written: 0,
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.write_all(bytes)?;
        self.hasher.update(bytes);
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_raw(&[value])
    }

    /// Write a u32 in little-endian byte order.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut buf = [0u8; 4];
        (&mut buf[..]).write_u32::<LittleEndian>(value)?;
        self.write_raw(&buf)
    }

    /// Write a u64 in little-endian byte order.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; 8];
        (&mut buf[..]).write_u64::<LittleEndian>(value)?;
        self.write_raw(&buf)
    }

    /// Write an f32 in little-endian byte order.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        let mut buf = [0u8; 4];
        (&mut buf[..]).write_f32::<LittleEndian>(value)?;
        self.write_raw(&buf)
    }

    /// Write a variable-length encoded u64.
    pub fn write_varint_u64(&mut self, value: u64) -> Result<()> {
        let encoded = crate::util::varint::encode_u64(value);
        self.write_raw(&encoded)
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_varint_u64(value.len() as u64)?;
        self.write_raw(value.as_bytes())
    }

    /// Write length-prefixed raw bytes.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_varint_u64(value.len() as u64)?;
        self.write_raw(value)
    }

    /// Number of payload bytes written so far, excluding the trailer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append the CRC32 trailer and flush the file to storage.
    pub fn close(mut self) -> Result<()> {
        let checksum = self.hasher.clone().finalize();
        let mut buf = [0u8; 4];
        (&mut buf[..]).write_u32::<LittleEndian>(checksum)?;
        self.output.write_all(&buf)?;
        self.output.flush_and_sync()?;
        Ok(())
    }
}

impl std::fmt::Debug for StructWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructWriter")
            .field("bytes_written", &self.bytes_written)
            .finish()
    }
}

/// Reader for structured binary data that verifies the CRC32 trailer.
pub struct StructReader {
    input: Box<dyn StorageInput>,
    hasher: Hasher,
    bytes_read: u64,
}

impl StructReader {
    /// Create a new structured reader over a storage input.
    pub fn new(input: Box<dyn StorageInput>) -> Self {
        StructReader {
            input,
            hasher: Hasher::new(),
            bytes_read: 0,
        }
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        self.input.read_exact(buf)?;
        self.hasher.update(buf);
        self.bytes_read += buf.len() as u64;
        Ok(())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_raw(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a u32 in little-endian byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_raw(&mut buf)?;
        Ok((&buf[..]).read_u32::<LittleEndian>()?)
    }

    /// Read a u64 in little-endian byte order.
    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_raw(&mut buf)?;
        Ok((&buf[..]).read_u64::<LittleEndian>()?)
    }

    /// Read an f32 in little-endian byte order.
    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_raw(&mut buf)?;
        Ok((&buf[..]).read_f32::<LittleEndian>()?)
    }

    /// Read a variable-length encoded u64.
    pub fn read_varint_u64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 {
                return Err(TabulaError::storage("varint overflows u64"));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_varint_u64()? as usize;
        let mut buf = vec![0u8; len];
        self.read_raw(&mut buf)?;
        String::from_utf8(buf).map_err(|err| TabulaError::storage(format!("invalid UTF-8: {err}")))
    }

    /// Read length-prefixed raw bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varint_u64()? as usize;
        let mut buf = vec![0u8; len];
        self.read_raw(&mut buf)?;
        Ok(buf)
    }

    /// Number of payload bytes read so far, excluding the trailer.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the CRC32 trailer and compare it against the running checksum.
    ///
    /// Must be called after all payload values were consumed.
    pub fn finish(mut self) -> Result<()> {
        let expected = self.hasher.clone().finalize();
        let mut buf = [0u8; 4];
        self.input.read_exact(&mut buf)?;
        let stored = (&buf[..]).read_u32::<LittleEndian>()?;
        if stored != expected {
            return Err(TabulaError::storage(format!(
                "checksum mismatch: stored {stored:#010x}, computed {expected:#010x}"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StructReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructReader")
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};

    #[test]
    fn test_round_trip_all_types() {
        let storage = MemoryStorage::default();

        let mut writer = StructWriter::new(storage.create_output("test.bin").unwrap());
        writer.write_u8(0x7F).unwrap();
        writer.write_u32(123_456).unwrap();
        writer.write_u64(u64::MAX).unwrap();
        writer.write_f32(2.5).unwrap();
        writer.write_varint_u64(300).unwrap();
        writer.write_string("caption").unwrap();
        writer.write_bytes(&[1, 2, 3]).unwrap();
        writer.close().unwrap();

        let mut reader = StructReader::new(storage.open_input("test.bin").unwrap());
        assert_eq!(reader.read_u8().unwrap(), 0x7F);
        assert_eq!(reader.read_u32().unwrap(), 123_456);
        assert_eq!(reader.read_u64().unwrap(), u64::MAX);
        assert_eq!(reader.read_f32().unwrap(), 2.5);
        assert_eq!(reader.read_varint_u64().unwrap(), 300);
        assert_eq!(reader.read_string().unwrap(), "caption");
        assert_eq!(reader.read_bytes().unwrap(), vec![1, 2, 3]);
        reader.finish().unwrap();
    }

    #[test]
    fn test_unicode_string() {
        let storage = MemoryStorage::default();

        let mut writer = StructWriter::new(storage.create_output("test.bin").unwrap());
        writer.write_string("schrödinger 表").unwrap();
        writer.close().unwrap();

        let mut reader = StructReader::new(storage.open_input("test.bin").unwrap());
        assert_eq!(reader.read_string().unwrap(), "schrödinger 表");
        reader.finish().unwrap();
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let storage = MemoryStorage::default();

        let mut writer = StructWriter::new(storage.create_output("test.bin").unwrap());
        writer.write_u32(42).unwrap();
        writer.close().unwrap();

        // Flip a payload byte.
        let mut input = storage.open_input("test.bin").unwrap();
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut input, &mut content).unwrap();
        content[0] ^= 0xFF;
        let mut output = storage.create_output("test.bin").unwrap();
        std::io::Write::write_all(&mut output, &content).unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let mut reader = StructReader::new(storage.open_input("test.bin").unwrap());
        let _ = reader.read_u32().unwrap();
        assert!(reader.finish().is_err());
    }

    #[test]
    fn test_truncated_file() {
        let storage = MemoryStorage::default();

        let mut writer = StructWriter::new(storage.create_output("test.bin").unwrap());
        writer.write_u64(7).unwrap();
        writer.close().unwrap();

        let mut input = storage.open_input("test.bin").unwrap();
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut input, &mut content).unwrap();
        content.truncate(4);
        let mut output = storage.create_output("test.bin").unwrap();
        std::io::Write::write_all(&mut output, &content).unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let mut reader = StructReader::new(storage.open_input("test.bin").unwrap());
        assert!(reader.read_u64().is_err());
    }

    #[test]
    fn test_bytes_written_excludes_trailer() {
        let storage = MemoryStorage::default();

        let mut writer = StructWriter::new(storage.create_output("test.bin").unwrap());
        writer.write_u32(1).unwrap();
        assert_eq!(writer.bytes_written(), 4);
        writer.close().unwrap();

        // 4 payload bytes plus the 4 byte trailer.
        assert_eq!(storage.file_size("test.bin").unwrap(), 8);
    }
}
