//! # Packet Reader
//!
//! Positioned cursor over the bytes of one inbound packet.
//!
//! The reader owns its buffer so a decoded packet can be handed from the
//! connection worker to the application thread without copying.

use bytemuck::Pod;

use crate::error::{DecodeError, DecodeResult};

/// Packet reader - reads little-endian primitives from an owned buffer.
#[derive(Clone, Debug, Default)]
pub struct PacketReader {
    buffer: Vec<u8>,
    position: usize,
}

impl PacketReader {
    /// Creates a reader positioned at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: Vec<u8>) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the current read position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Returns the unread bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[self.position..]
    }

    /// Total length of the packet, opcode included.
    #[inline]
    #[must_use]
    pub fn packet_len(&self) -> usize {
        self.buffer.len()
    }

    fn take(&mut self, needed: usize) -> DecodeResult<&[u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(DecodeError::UnexpectedEof { needed, remaining });
        }
        let start = self.position;
        self.position += needed;
        Ok(&self.buffer[start..self.position])
    }

    fn take_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads a u16.
    #[inline]
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Reads a u32.
    #[inline]
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Reads a u64.
    #[inline]
    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    /// Reads an i8.
    #[inline]
    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        self.take_array().map(i8::from_le_bytes)
    }

    /// Reads an i16.
    #[inline]
    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        self.take_array().map(i16::from_le_bytes)
    }

    /// Reads an i32.
    #[inline]
    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Reads an i64.
    #[inline]
    pub fn read_i64(&mut self) -> DecodeResult<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    /// Reads an f32.
    #[inline]
    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        self.take_array().map(f32::from_le_bytes)
    }

    /// Reads an f64.
    #[inline]
    pub fn read_f64(&mut self) -> DecodeResult<f64> {
        self.take_array().map(f64::from_le_bytes)
    }

    /// Reads a bool written as a 0/1 byte.
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    /// Reads a length-prefixed byte slice.
    pub fn read_bytes(&mut self) -> DecodeResult<Vec<u8>> {
        let len = self.read_u32()? as usize;
        self.take(len).map(<[u8]>::to_vec)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> DecodeResult<String> {
        String::from_utf8(self.read_bytes()?).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Reads everything that is left.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let rest = self.as_slice().to_vec();
        self.position = self.buffer.len();
        rest
    }

    /// Reads a Pod type directly.
    pub fn read_pod<T: Pod>(&mut self) -> DecodeResult<T> {
        let bytes = self.take(std::mem::size_of::<T>())?;
        bytemuck::try_pod_read_unaligned(bytes)
            .map_err(|e| DecodeError::Malformed(format!("pod read failed: {e:?}")))
    }
}
