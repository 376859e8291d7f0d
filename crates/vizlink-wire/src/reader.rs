//! Cursor-tracked binary decode
//!
//! All fixed-width values are little-endian. The reader is stateless apart
//! from its cursor: independent buffers can be decoded concurrently, a single
//! reader must not be shared. Reading past the end of the buffer is a fatal
//! decode error; there is no default-zero fallback.

use vizlink_core::{VizError, VizResult};

/// Decodes typed values from a byte buffer at a tracked offset.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Start decoding at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    /// Resume decoding at a saved offset. Used by the time-boxed
    /// initialization loops, which park their cursor between steps.
    pub fn resume(buf: &'a [u8], pos: usize) -> Self {
        WireReader { buf, pos }
    }

    /// Current byte offset into the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> VizResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(VizError::BufferUnderrun {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> VizResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> VizResult<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn u16(&mut self) -> VizResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> VizResult<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> VizResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> VizResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64(&mut self) -> VizResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn i64(&mut self) -> VizResult<i64> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn f32(&mut self) -> VizResult<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    pub fn f64(&mut self) -> VizResult<f64> {
        Ok(f64::from_bits(self.u64()?))
    }

    /// One byte, nonzero = true.
    pub fn bool(&mut self) -> VizResult<bool> {
        Ok(self.u8()? != 0)
    }

    /// Length-prefixed UTF-8 text: u64 length, then that many bytes, no
    /// terminator. A length that exceeds the remaining buffer is a malformed
    /// length, not an underrun; corrupted prefixes fail here instead of
    /// attempting a clamped read.
    pub fn string(&mut self) -> VizResult<String> {
        let at = self.pos;
        let len = self.u64()?;
        if len > self.remaining() as u64 {
            return Err(VizError::MalformedLength {
                offset: at,
                length: len,
            });
        }
        let bytes = self.take(len as usize)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| VizError::InvalidUtf8 { offset: at })
    }
}
