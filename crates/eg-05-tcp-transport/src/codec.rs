//! Length-prefixed frame codec.

use eg_04_dissemination::TransportError;

/// Size of the little-endian `u32` length header.
pub const FRAME_HEADER_BYTES: usize = 4;

/// Prefix `payload` with its length. Fails if it exceeds `max`.
pub fn encode_frame(payload: &[u8], max: usize) -> Result<Vec<u8>, TransportError> {
    let size = payload.len();
    if size > max || u32::try_from(size).is_err() {
        return Err(TransportError::FrameTooLarge { size, max });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_BYTES + size);
    frame.extend_from_slice(&(size as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Incremental decoder for a stream of frames.
///
/// Bytes are pushed as they arrive; complete payloads are drained with
/// [`next_frame`](Self::next_frame).
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max: usize,
}

impl FrameDecoder {
    pub fn new(max: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete payload, `Ok(None)` if more bytes are needed.
    ///
    /// An oversize length header is an error; the stream cannot be resynced.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(header) = self.buffer.get(..FRAME_HEADER_BYTES) else {
            return Ok(None);
        };

        let size = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if size > self.max {
            return Err(TransportError::FrameTooLarge {
                size,
                max: self.max,
            });
        }

        let end = FRAME_HEADER_BYTES + size;
        if self.buffer.len() < end {
            return Ok(None);
        }

        let payload = self.buffer[FRAME_HEADER_BYTES..end].to_vec();
        self.buffer.drain(..end);
        Ok(Some(payload))
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
