//! Byte level sources and sinks.
//!
//! Compressed data is either an in-memory buffer or a borrowed `std::io` stream.
//! The container reader/writer and the bit stream engine treat both uniformly.

use crate::error::JpeglsError;
use std::io::{self, Read, Seek, Write};

/// A readable, seekable stream. Implemented for every `Read + Seek` type.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Source of compressed bytes.
pub enum ByteSource<'a> {
    /// The remaining, unread part of an in-memory buffer.
    Buffer(&'a [u8]),
    /// A borrowed stream positioned at the next unread byte.
    Stream(&'a mut dyn ReadSeek),
}

impl<'a> ByteSource<'a> {
    pub fn read_u8(&mut self) -> Result<u8, JpeglsError> {
        match self {
            ByteSource::Buffer(data) => {
                let (&first, rest) = data
                    .split_first()
                    .ok_or(JpeglsError::CompressedBufferTooSmall)?;
                *data = rest;
                Ok(first)
            }
            ByteSource::Stream(stream) => {
                let mut byte = [0u8; 1];
                stream
                    .read_exact(&mut byte)
                    .map_err(|_| JpeglsError::CompressedBufferTooSmall)?;
                Ok(byte[0])
            }
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, JpeglsError> {
        let high = self.read_u8()? as u16;
        let low = self.read_u8()? as u16;
        Ok((high << 8) | low)
    }

    pub fn read_bytes(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        match self {
            ByteSource::Buffer(data) => {
                if data.len() < destination.len() {
                    return Err(JpeglsError::CompressedBufferTooSmall);
                }
                let (head, rest) = data.split_at(destination.len());
                destination.copy_from_slice(head);
                *data = rest;
                Ok(())
            }
            ByteSource::Stream(stream) => stream
                .read_exact(destination)
                .map_err(|_| JpeglsError::CompressedBufferTooSmall),
        }
    }

    /// Skips `count` bytes; running out of data is a sizing error.
    pub fn skip(&mut self, count: usize) -> Result<(), JpeglsError> {
        match self {
            ByteSource::Buffer(data) => {
                if data.len() < count {
                    return Err(JpeglsError::CompressedBufferTooSmall);
                }
                *data = &data[count..];
                Ok(())
            }
            ByteSource::Stream(stream) => {
                let mut limited = Read::take(&mut **stream, count as u64);
                let skipped = io::copy(&mut limited, &mut io::sink())
                    .map_err(|_| JpeglsError::CompressedBufferTooSmall)?;
                if skipped != count as u64 {
                    return Err(JpeglsError::CompressedBufferTooSmall);
                }
                Ok(())
            }
        }
    }
}

/// Destination of compressed bytes.
pub enum ByteSink<'a> {
    /// A fixed size buffer; `position` is the number of bytes already written.
    Buffer { data: &'a mut [u8], position: usize },
    /// A borrowed stream; `bytes_written` counts what has been pushed so far.
    Stream {
        stream: &'a mut dyn Write,
        bytes_written: usize,
    },
}

impl<'a> ByteSink<'a> {
    pub fn from_buffer(data: &'a mut [u8]) -> Self {
        ByteSink::Buffer { data, position: 0 }
    }

    pub fn from_stream(stream: &'a mut dyn Write) -> Self {
        ByteSink::Stream {
            stream,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> usize {
        match self {
            ByteSink::Buffer { position, .. } => *position,
            ByteSink::Stream { bytes_written, .. } => *bytes_written,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), JpeglsError> {
        match self {
            ByteSink::Buffer { data, position } => {
                let end = *position + bytes.len();
                if end > data.len() {
                    return Err(JpeglsError::CompressedBufferTooSmall);
                }
                data[*position..end].copy_from_slice(bytes);
                *position = end;
                Ok(())
            }
            ByteSink::Stream {
                stream,
                bytes_written,
            } => {
                stream
                    .write_all(bytes)
                    .map_err(|_| JpeglsError::CompressedBufferTooSmall)?;
                *bytes_written += bytes.len();
                Ok(())
            }
        }
    }

    /// Accounts for `count` bytes that were produced directly into the sink by a scan encoder.
    pub fn seek(&mut self, count: usize) {
        match self {
            ByteSink::Buffer { position, .. } => *position += count,
            ByteSink::Stream { bytes_written, .. } => *bytes_written += count,
        }
    }

    pub fn flush(&mut self) -> Result<(), JpeglsError> {
        match self {
            ByteSink::Buffer { .. } => Ok(()),
            ByteSink::Stream { stream, .. } => stream
                .flush()
                .map_err(|_| JpeglsError::CompressedBufferTooSmall),
        }
    }
}
