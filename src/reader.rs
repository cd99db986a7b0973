use std::io::Cursor;

use crate::error::ParseError;
use crate::text;

/// A bounded, little-endian cursor over a borrowed byte slice.
///
/// Every read advances the cursor by exactly the bytes consumed and fails
/// with [`ParseError::UnexpectedEnd`] carrying the offset at which the
/// read was attempted when fewer bytes remain than requested. The cursor
/// position never exceeds the slice length.
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len() - self.offset()
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        let pos = self.offset();
        let new_pos = pos
            .checked_add(len)
            .ok_or(ParseError::UnexpectedEnd { offset: pos })?;
        if new_pos > self.cursor.get_ref().len() {
            return Err(ParseError::UnexpectedEnd { offset: pos });
        }
        self.cursor.set_position(new_pos as u64);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.read_exact::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        Ok(u16::from_le_bytes(self.read_exact::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        Ok(u32::from_le_bytes(self.read_exact::<4>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        Ok(i32::from_le_bytes(self.read_exact::<4>()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, ParseError> {
        Ok(f64::from_le_bytes(self.read_exact::<8>()?))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        let mut buf = vec![0_u8; len];
        self.read_exact_into(&mut buf)?;
        Ok(buf)
    }

    /// Reads a one-byte length prefix followed by that many raw bytes,
    /// decoded as Shift-JIS. Trailing NUL padding is stripped and invalid
    /// byte sequences are replaced with `U+FFFD`; this never fails on
    /// account of the text content itself.
    pub fn read_sjis_u8len(&mut self) -> Result<String, ParseError> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(text::decode_sjis(&bytes))
    }

    /// Reads a two-byte length prefix followed by that many raw bytes,
    /// decoded as Shift-JIS. See [`Reader::read_sjis_u8len`] for the
    /// lossy-decode contract.
    pub fn read_sjis_u16len(&mut self) -> Result<String, ParseError> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(text::decode_sjis(&bytes))
    }

    /// Reads a length-prefixed ASCII tag (class names, which are always
    /// plain ASCII identifiers in JWW). The bytes are decoded losslessly
    /// rather than through the Shift-JIS codec, since class tags never
    /// carry Japanese text.
    pub fn read_ascii_u16len(&mut self) -> Result<String, ParseError> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_exact<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut buf = [0_u8; N];
        self.read_exact_into(&mut buf)?;
        Ok(buf)
    }

    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        let pos = self.offset();
        let end = pos
            .checked_add(buf.len())
            .ok_or(ParseError::UnexpectedEnd { offset: pos })?;
        let src = self.cursor.get_ref();
        if end > src.len() {
            return Err(ParseError::UnexpectedEnd { offset: pos });
        }
        buf.copy_from_slice(&src[pos..end]);
        self.cursor.set_position(end as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::error::ParseError;

    #[test]
    fn read_numeric_values() {
        let data = [
            0x01, // u8
            0x02, 0x00, // u16
            0xFF, 0xFF, 0xFF, 0xFF, // i32 (-1)
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // f64 (1.0)
        ];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u16().unwrap(), 2);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.read_f64().unwrap(), 1.0);
        assert_eq!(reader.offset(), data.len());
    }

    #[test]
    fn reads_never_exceed_length() {
        let data = [0x01, 0x02];
        let mut reader = Reader::new(&data);
        reader.read_u8().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEnd { offset: 1 });
        assert_eq!(reader.offset(), 1);
    }

    #[test]
    fn skip_past_end_fails_without_moving() {
        let data = [0x00; 4];
        let mut reader = Reader::new(&data);
        assert!(reader.skip(10).is_err());
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn read_sjis_u8len_trims_trailing_nul() {
        let data = [4, b'a', b'b', 0, 0];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_sjis_u8len().unwrap(), "ab");
    }

    #[test]
    fn read_ascii_u16len_reads_class_tag() {
        let mut data = vec![8, 0];
        data.extend_from_slice(b"CDataSen");
        let mut reader = Reader::new(&data);
        assert_eq!(reader.read_ascii_u16len().unwrap(), "CDataSen");
    }
}
