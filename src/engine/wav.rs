//! PCM-to-Container Encoder
//!
//! Serializes a mono float buffer into a canonical 44-byte-header RIFF/WAVE
//! file with 16-bit signed little-endian samples. Output must stay
//! byte-identical across versions: golden files are compared by checksum.
//!
//! Layout (all integers little-endian):
//!
//! | Offset | Size | Field         | Value                 |
//! |--------|------|---------------|-----------------------|
//! | 0      | 4    | ChunkID       | `RIFF`                |
//! | 4      | 4    | ChunkSize     | file length - 8       |
//! | 8      | 4    | Format        | `WAVE`                |
//! | 12     | 4    | Subchunk1ID   | `fmt `                |
//! | 16     | 4    | Subchunk1Size | 16                    |
//! | 20     | 2    | AudioFormat   | 1 (PCM)               |
//! | 22     | 2    | NumChannels   | 1                     |
//! | 24     | 4    | SampleRate    | source rate           |
//! | 28     | 4    | ByteRate      | SampleRate * 2        |
//! | 32     | 2    | BlockAlign    | 2                     |
//! | 34     | 2    | BitsPerSample | 16                    |
//! | 36     | 4    | Subchunk2ID   | `data`                |
//! | 40     | 4    | Subchunk2Size | frame count * 2       |
//! | 44     | -    | Data          | i16 samples           |

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::engine::buffer::MonoBuffer;
use crate::error::{KaraokeError, Result};

/// Size of the canonical header in bytes
pub const HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: usize = 2;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

// ============================================================================
// Binary writer
// ============================================================================

/// Little-endian byte writer with an explicit cursor.
///
/// Writes past the end grow the buffer; writes before the end overwrite.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteWriter {
    /// Writer over a zero-filled buffer of `len` bytes
    pub fn with_len(len: usize) -> Self {
        Self {
            buf: vec![0; len],
            pos: 0,
        }
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Four-character chunk tag such as `RIFF`
    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.put(tag);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, value: i16) {
        self.put(&value.to_le_bytes());
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }
}

// ============================================================================
// Sample conversion
// ============================================================================

/// Convert one float sample to 16-bit PCM.
///
/// Clamp to [-1, 1], then scale by 32768 when `0.5 + s < 0` and by 32767
/// otherwise, truncating toward zero. The split lets -1.0 reach -32768
/// without 1.0 overflowing; -0.5 itself takes the 32767 branch. NaN maps
/// to 0.
#[inline]
pub fn float_to_pcm16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }

    let s = (sample as f64).clamp(-1.0, 1.0);
    let scaled = if 0.5 + s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled as i16
}

// ============================================================================
// Encoded container
// ============================================================================

/// A complete, well-formed WAV file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContainer {
    bytes: Vec<u8>,
    sample_rate: u32,
    frame_count: usize,
}

impl EncodedContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total file length, header included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Never true: the header is always present
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    /// Parsed header fields
    pub fn header(&self) -> Result<WavHeader> {
        WavHeader::parse(&self.bytes)
    }

    /// Encoded 16-bit samples, in order
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes[HEADER_LEN..]
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
    }

    /// SHA-256 of the whole file, lowercase hex
    pub fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }
}

/// Encode a mono buffer as a canonical 16-bit PCM WAV file.
///
/// A zero-length buffer produces a bare 44-byte header.
///
/// # Errors
/// * `InvalidContainer` - the data would not fit in a 32-bit RIFF size field
pub fn encode_wav(buffer: &MonoBuffer) -> Result<EncodedContainer> {
    let frame_count = buffer.frame_count();
    let sample_rate = buffer.sample_rate();

    let data_len = frame_count
        .checked_mul(BYTES_PER_SAMPLE)
        .filter(|&len| len <= u32::MAX as usize - HEADER_LEN)
        .ok_or_else(|| KaraokeError::InvalidContainer {
            reason: format!("{} frames exceed the 4 GiB RIFF limit", frame_count),
        })?;
    let byte_rate = sample_rate
        .checked_mul(BYTES_PER_SAMPLE as u32)
        .ok_or_else(|| KaraokeError::InvalidContainer {
            reason: format!("sample rate {} Hz is too high", sample_rate),
        })?;
    let file_len = HEADER_LEN + data_len;

    let mut writer = ByteWriter::with_len(file_len);

    writer.write_tag(b"RIFF");
    writer.write_u32_le((file_len - 8) as u32);
    writer.write_tag(b"WAVE");

    writer.write_tag(b"fmt ");
    writer.write_u32_le(FMT_CHUNK_LEN);
    writer.write_u16_le(PCM_FORMAT);
    writer.write_u16_le(1);
    writer.write_u32_le(sample_rate);
    writer.write_u32_le(byte_rate);
    writer.write_u16_le(BYTES_PER_SAMPLE as u16);
    writer.write_u16_le(16);

    writer.write_tag(b"data");
    writer.write_u32_le(data_len as u32);

    for &sample in buffer.samples() {
        writer.write_i16_le(float_to_pcm16(sample));
    }

    debug_assert_eq!(writer.position(), file_len);
    debug!(frame_count, sample_rate, bytes = file_len, "encoded WAV container");

    Ok(EncodedContainer {
        bytes: writer.into_inner(),
        sample_rate,
        frame_count,
    })
}

// ============================================================================
// Header parsing
// ============================================================================

/// Fields of a canonical 44-byte WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub fmt_chunk_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parse the canonical header at the start of `bytes`
    ///
    /// # Errors
    /// * `InvalidContainer` - fewer than 44 bytes or unexpected chunk tags
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(KaraokeError::InvalidContainer {
                reason: format!("{} bytes is shorter than a WAV header", bytes.len()),
            });
        }

        for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            if &bytes[offset..offset + 4] != tag {
                return Err(KaraokeError::InvalidContainer {
                    reason: format!(
                        "expected '{}' at offset {}",
                        String::from_utf8_lossy(tag),
                        offset
                    ),
                });
            }
        }

        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u32_at =
            |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);

        Ok(Self {
            chunk_size: u32_at(4),
            fmt_chunk_size: u32_at(16),
            audio_format: u16_at(20),
            num_channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0.0, 0 ; "silence")]
    #[test_case(1.0, 32767 ; "positive full scale")]
    #[test_case(-1.0, -32768 ; "negative full scale")]
    #[test_case(-0.5, -16383 ; "minus half takes the 32767 branch")]
    #[test_case(-0.500001, -16384 ; "just below minus half takes the 32768 branch")]
    #[test_case(0.5, 16383 ; "plus half truncates")]
    #[test_case(1.5, 32767 ; "clamped above")]
    #[test_case(-2.0, -32768 ; "clamped below")]
    #[test_case(f32::INFINITY, 32767 ; "positive infinity")]
    #[test_case(f32::NEG_INFINITY, -32768 ; "negative infinity")]
    #[test_case(f32::NAN, 0 ; "nan")]
    #[test_case(-0.00001, 0 ; "tiny negative truncates toward zero")]
    fn test_float_to_pcm16(input: f32, expected: i16) {
        assert_eq!(float_to_pcm16(input), expected);
    }

    #[test]
    fn test_byte_writer_cursor() {
        let mut writer = ByteWriter::with_len(4);
        writer.write_u16_le(0x0201);
        assert_eq!(writer.position(), 2);
        writer.write_u32_le(0x06050403);
        assert_eq!(writer.position(), 6);
        writer.seek(0);
        writer.write_i16_le(-1);
        assert_eq!(writer.into_inner(), vec![0xFF, 0xFF, 3, 4, 5, 6]);
    }

    #[test]
    fn test_zero_length_container() {
        let container = encode_wav(&MonoBuffer::new(44100, Vec::new())).unwrap();
        assert_eq!(container.len(), HEADER_LEN);

        let header = container.header().unwrap();
        assert_eq!(header.data_size, 0);
        assert_eq!(header.chunk_size, 36);
        assert_eq!(container.samples().count(), 0);
    }

    #[test]
    fn test_header_fields() {
        let container = encode_wav(&MonoBuffer::new(22050, vec![0.1; 10])).unwrap();
        let header = container.header().unwrap();

        assert_eq!(
            header,
            WavHeader {
                chunk_size: (container.len() - 8) as u32,
                fmt_chunk_size: 16,
                audio_format: 1,
                num_channels: 1,
                sample_rate: 22050,
                byte_rate: 44100,
                block_align: 2,
                bits_per_sample: 16,
                data_size: 20,
            }
        );
        assert_eq!(&container.as_bytes()[0..4], b"RIFF");
        assert_eq!(&container.as_bytes()[36..40], b"data");
    }

    #[test]
    fn test_samples_little_endian() {
        let container = encode_wav(&MonoBuffer::new(8000, vec![1.0, -1.0])).unwrap();
        assert_eq!(&container.as_bytes()[44..], &[0xFF, 0x7F, 0x00, 0x80]);
        assert_eq!(container.samples().collect::<Vec<_>>(), vec![32767, -32768]);
    }

    #[test]
    fn test_hound_reads_output() {
        let input: Vec<f32> = (0..100).map(|i| (i as f32 / 100.0) * 2.0 - 1.0).collect();
        let container = encode_wav(&MonoBuffer::new(48000, input.clone())).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(container.as_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        let expected: Vec<i16> = input.iter().map(|&s| float_to_pcm16(s)).collect();
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_checksum_stable() {
        let a = encode_wav(&MonoBuffer::new(44100, vec![0.25, -0.75])).unwrap();
        let b = encode_wav(&MonoBuffer::new(44100, vec![0.25, -0.75])).unwrap();
        let c = encode_wav(&MonoBuffer::new(44100, vec![0.25, -0.70])).unwrap();

        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(a.checksum().len(), 64);
    }

    #[test]
    fn test_parse_rejects_bad_headers() {
        assert!(matches!(
            WavHeader::parse(&[0; 10]),
            Err(KaraokeError::InvalidContainer { .. })
        ));

        let mut bytes = encode_wav(&MonoBuffer::new(44100, vec![0.0]))
            .unwrap()
            .into_bytes();
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(WavHeader::parse(&bytes).is_err());
    }
}
