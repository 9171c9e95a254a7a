//! Position-aware primitive reader.
//!
//! [`BinaryReader`] owns the stream of exactly one decode pass. It tracks its
//! own position, which only ever moves forward, knows the total stream
//! length so that declared counts can be validated before anything is
//! allocated, and switches endianness once the header has announced it.

use std::{
    io::{Cursor, Read, Seek, SeekFrom},
    sync::Arc,
};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use cgmath::{Matrix3, Quaternion, Vector3, Vector4};
use log::warn;

use crate::{
    error::{NifError, Result},
    format::{header::Header, refs::BlockRef, version::Versions},
};

/// Longest header line accepted before giving up on the magic.
const MAX_HEADER_LINE: usize = 128;

/// Index value meaning "no string" in string-table streams.
pub const NO_STRING: u32 = u32::MAX;

pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

macro_rules! read_endian {
    ($name:ident, $ty:ty, $method:ident, $size:expr) => {
        pub fn $name(&mut self) -> Result<$ty> {
            self.ensure($size)?;
            let value = match self.endian {
                Endian::Little => self.inner.$method::<LittleEndian>(),
                Endian::Big => self.inner.$method::<BigEndian>(),
            };
            let value = value.map_err(|e| self.io_error(e))?;
            self.position += $size;
            Ok(value)
        }
    };
}

pub struct BinaryReader {
    inner: Box<dyn ReadSeek + Send>,
    file_name: Arc<str>,
    endian: Endian,
    position: u64,
    len: u64,
}

impl BinaryReader {
    /// Wraps a stream that is positioned at the start of a file. The stream
    /// may contain other data before that point (archives); only the bytes
    /// from the current position onward are considered.
    pub fn new(mut stream: impl ReadSeek + Send + 'static, file_name: &str) -> Result<Self> {
        let io = |source, offset| NifError::Io {
            file: file_name.to_string(),
            offset,
            source,
        };
        let start = stream.stream_position().map_err(|e| io(e, 0))?;
        let end = stream.seek(SeekFrom::End(0)).map_err(|e| io(e, start))?;
        stream.seek(SeekFrom::Start(start)).map_err(|e| io(e, start))?;
        Ok(Self {
            inner: Box::new(stream),
            file_name: Arc::from(file_name),
            endian: Endian::Little,
            position: start,
            len: end,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>, file_name: &str) -> Self {
        let len = bytes.len() as u64;
        Self {
            inner: Box::new(Cursor::new(bytes)),
            file_name: Arc::from(file_name),
            endian: Endian::Little,
            position: 0,
            len,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    fn io_error(&self, source: std::io::Error) -> NifError {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            return self.eof(1);
        }
        NifError::Io {
            file: self.file_name.to_string(),
            offset: self.position,
            source,
        }
    }

    fn eof(&self, needed: u64) -> NifError {
        NifError::UnexpectedEof {
            file: self.file_name.to_string(),
            offset: self.position,
            needed,
        }
    }

    pub(crate) fn malformed_header(&self, reason: impl Into<String>) -> NifError {
        NifError::MalformedHeader {
            file: self.file_name.to_string(),
            offset: self.position,
            reason: reason.into(),
        }
    }

    fn ensure(&self, bytes: u64) -> Result<()> {
        if bytes > self.remaining() {
            return Err(self.eof(bytes - self.remaining()));
        }
        Ok(())
    }

    /// Validates that `count` elements of `element_size` bytes fit into the
    /// rest of the stream.
    pub fn check_count(&self, count: u64, element_size: u64) -> Result<usize> {
        let total = count.saturating_mul(element_size);
        self.ensure(total)?;
        Ok(count as usize)
    }

    pub fn skip(&mut self, bytes: u64) -> Result<()> {
        self.ensure(bytes)?;
        let offset = i64::try_from(bytes).map_err(|_| self.eof(bytes))?;
        self.inner
            .seek(SeekFrom::Current(offset))
            .map_err(|e| self.io_error(e))?;
        self.position += bytes;
        Ok(())
    }

    /// Splits off the next `bytes` bytes as a reader of their own. Positions
    /// reported by the new reader stay relative to the whole file, and this
    /// reader moves past the split bytes whatever the new one does with them.
    pub fn take(&mut self, bytes: u64) -> Result<BinaryReader> {
        let start = self.position;
        let count = usize::try_from(bytes).map_err(|_| self.eof(bytes))?;
        let buf = self.read_bytes(count)?;
        Ok(Self {
            inner: Box::new(Cursor::new(buf)),
            file_name: Arc::clone(&self.file_name),
            endian: self.endian,
            position: start,
            len: start + bytes,
        })
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.ensure(count as u64)?;
        let mut buf = vec![0u8; count];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| self.io_error(e))?;
        self.position += count as u64;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.inner.read_u8().map_err(|e| self.io_error(e))?;
        self.position += 1;
        Ok(value)
    }

    read_endian!(read_u16, u16, read_u16, 2);
    read_endian!(read_u32, u32, read_u32, 4);
    read_endian!(read_i16, i16, read_i16, 2);
    read_endian!(read_i32, i32, read_i32, 4);
    read_endian!(read_f32, f32, read_f32, 4);

    pub fn read_f16(&mut self) -> Result<f32> {
        Ok(half_to_f32(self.read_u16()?))
    }

    /// Booleans are a byte in modern streams and a full u32 in old ones.
    pub fn read_bool(&mut self, versions: &Versions) -> Result<bool> {
        if versions.bool_is_byte() {
            Ok(self.read_u8()? != 0)
        } else {
            Ok(self.read_u32()? != 0)
        }
    }

    /// Count prefix (u32) validated against the remaining stream length.
    pub fn read_count(&mut self, element_size: u64) -> Result<usize> {
        let count = self.read_u32()? as u64;
        self.check_count(count, element_size)
    }

    pub fn read_vec2(&mut self) -> Result<[f32; 2]> {
        Ok([self.read_f32()?, self.read_f32()?])
    }

    pub fn read_vec3(&mut self) -> Result<Vector3<f32>> {
        Ok(Vector3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vector4<f32>> {
        Ok(Vector4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_color3(&mut self) -> Result<[f32; 3]> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    pub fn read_color4(&mut self) -> Result<[f32; 4]> {
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    /// Havok quaternions are stored x, y, z, w.
    pub fn read_quat_xyzw(&mut self) -> Result<Quaternion<f32>> {
        let (x, y, z, w) = (
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        );
        Ok(Quaternion::new(w, x, y, z))
    }

    /// 3x3 matrix stored row by row.
    pub fn read_matrix33(&mut self) -> Result<Matrix3<f32>> {
        let mut rows = [[0f32; 3]; 3];
        for row in rows.iter_mut() {
            for value in row.iter_mut() {
                *value = self.read_f32()?;
            }
        }
        Ok(Matrix3::from_cols(
            Vector3::new(rows[0][0], rows[1][0], rows[2][0]),
            Vector3::new(rows[0][1], rows[1][1], rows[2][1]),
            Vector3::new(rows[0][2], rows[1][2], rows[2][2]),
        ))
    }

    pub fn read_ref(&mut self) -> Result<BlockRef> {
        Ok(BlockRef(self.read_i32()?))
    }

    pub fn read_refs(&mut self) -> Result<Vec<BlockRef>> {
        let count = self.read_count(4)?;
        (0..count).map(|_| self.read_ref()).collect()
    }

    pub fn read_u16s(&mut self, count: usize) -> Result<Vec<u16>> {
        self.check_count(count as u64, 2)?;
        (0..count).map(|_| self.read_u16()).collect()
    }

    pub fn read_u32s(&mut self, count: usize) -> Result<Vec<u32>> {
        self.check_count(count as u64, 4)?;
        (0..count).map(|_| self.read_u32()).collect()
    }

    /// u32 length followed by that many bytes.
    pub fn read_sized_string(&mut self) -> Result<String> {
        let len = self.read_count(1)?;
        let bytes = self.read_bytes(len)?;
        Ok(decode_text(&bytes))
    }

    /// u8 length followed by that many bytes, the last usually a NUL.
    pub fn read_short_string(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(decode_text(&bytes))
    }

    /// Reads the newline-terminated header line. Gives up after a bounded
    /// number of bytes, which is how a stream that is not a scene file at
    /// all is recognised.
    pub fn read_header_line(&mut self) -> Result<String> {
        let mut line = Vec::with_capacity(48);
        while line.len() < MAX_HEADER_LINE {
            if self.remaining() == 0 {
                return Err(self.malformed_header("stream ended before the header line terminator"));
            }
            let byte = self.read_u8()?;
            if byte == b'\n' {
                return Ok(decode_text(&line));
            }
            line.push(byte);
        }
        Err(self.malformed_header(format!(
            "no header line terminator within {MAX_HEADER_LINE} bytes"
        )))
    }

    /// A string field: inline before the string table existed, an index
    /// into it afterwards. Both "no string" encodings read as `None`.
    pub fn read_string(&mut self, header: &Header) -> Result<Option<String>> {
        if !header.versions.has_string_table() {
            let text = self.read_sized_string()?;
            return Ok((!text.is_empty()).then_some(text));
        }
        let index = self.read_u32()?;
        if index == NO_STRING {
            return Ok(None);
        }
        match header.string(index) {
            Some(text) => Ok(Some(text.to_string())),
            None => {
                warn!(
                    "{}: string index {} at offset {} is outside the string table ({} entries)",
                    self.file_name,
                    index,
                    self.position - 4,
                    header.strings.len()
                );
                Ok(None)
            }
        }
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |last| last + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// IEEE 754 binary16 to binary32.
pub fn half_to_f32(bits: u16) -> f32 {
    let sign = ((bits >> 15) as u32) << 31;
    let exponent = ((bits >> 10) & 0x1F) as u32;
    let mantissa = (bits & 0x3FF) as u32;
    let value = match (exponent, mantissa) {
        (0, 0) => sign,
        (0, _) => {
            let mut e = 127 - 15 + 1;
            let mut m = mantissa;
            while m & 0x400 == 0 {
                m <<= 1;
                e -= 1;
            }
            sign | (e << 23) | ((m & 0x3FF) << 13)
        }
        (0x1F, 0) => sign | 0x7F80_0000,
        (0x1F, _) => sign | 0x7FC0_0000 | (mantissa << 13),
        _ => sign | ((exponent + 127 - 15) << 23) | (mantissa << 13),
    };
    f32::from_bits(value)
}
