use std::fs;
use std::path::Path;

use super::error::{invalid_format, LoadError};

pub(crate) fn read_resource_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Little-endian cursor over a resource file. Every read reports the file path
/// on failure so a truncated asset names itself.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
    path: &'a Path,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8], path: &'a Path) -> Self {
        Self {
            bytes,
            cursor: 0,
            path,
        }
    }

    pub(crate) fn path(&self) -> &'a Path {
        self.path
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.cursor == self.bytes.len()
    }

    pub(crate) fn expect_end(&self) -> Result<(), LoadError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.invalid(format!(
                "unexpected {} trailing bytes",
                self.remaining()
            )))
        }
    }

    /// Rejects a record count whose minimum encoded size is more than the
    /// file has left, before anything is allocated for it.
    pub(crate) fn ensure_records(
        &self,
        count: usize,
        min_record_len: usize,
    ) -> Result<(), LoadError> {
        match count.checked_mul(min_record_len) {
            Some(needed) if needed <= self.remaining() => Ok(()),
            _ => Err(self.invalid(format!(
                "{count} records of at least {min_record_len} bytes exceed the {} bytes left",
                self.remaining()
            ))),
        }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, LoadError> {
        let raw = self.read_exact(1)?;
        Ok(raw[0])
    }

    /// Any nonzero byte reads as `true`.
    pub(crate) fn read_bool(&mut self) -> Result<bool, LoadError> {
        Ok(self.read_u8()? != 0)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, LoadError> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, LoadError> {
        Ok(i32::from_le_bytes(self.read_array::<4>()?))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], LoadError> {
        let path = self.path;
        self.read_exact(N)?
            .try_into()
            .map_err(|_| invalid_format(path, format!("invalid {N}-byte encoding")))
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let end = self.cursor.saturating_add(len);
        if end > self.bytes.len() {
            return Err(self.invalid("unexpected end of file"));
        }
        let out = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(out)
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> LoadError {
        invalid_format(self.path, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields_in_order() {
        let bytes = [0x07, 0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF, 0x01];
        let mut reader = ByteReader::new(&bytes, Path::new("t.bin"));
        assert_eq!(reader.read_u8().expect("u8"), 7);
        assert_eq!(reader.read_u16().expect("u16"), 0x1234);
        assert_eq!(reader.read_i32().expect("i32"), -2);
        assert!(reader.read_bool().expect("bool"));
        reader.expect_end().expect("end");
    }

    #[test]
    fn truncated_input_is_invalid_format() {
        let bytes = [0x01, 0x02];
        let mut reader = ByteReader::new(&bytes, Path::new("short.bin"));
        let error = reader.read_i32().expect_err("must fail");
        assert!(matches!(error, LoadError::InvalidFormat { .. }));
        assert!(error.to_string().contains("short.bin"));
    }

    #[test]
    fn any_nonzero_bool_byte_is_true() {
        let bytes = [0, 2, 0xFF];
        let mut reader = ByteReader::new(&bytes, Path::new("b.bin"));
        assert!(!reader.read_bool().expect("zero"));
        assert!(reader.read_bool().expect("two"));
        assert!(reader.read_bool().expect("max"));
    }

    #[test]
    fn record_counts_are_checked_against_remaining_bytes() {
        let bytes = [0u8; 20];
        let reader = ByteReader::new(&bytes, Path::new("r.bin"));
        reader.ensure_records(2, 10).expect("exact fit");
        assert!(reader.ensure_records(3, 10).is_err());
        assert!(reader.ensure_records(usize::MAX, 10).is_err());
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let bytes = [0, 0];
        let mut reader = ByteReader::new(&bytes, Path::new("x.bin"));
        reader.read_u8().expect("u8");
        assert!(reader.expect_end().is_err());
    }
}
