//! Audio Ingestion & Decode
//!
//! Turns a user-supplied file into planar float PCM at its native sample
//! rate. Codec work is delegated to `symphonia` (MP3, AAC/M4A, WAV) and to
//! `hound` for plain RIFF/WAVE, which keeps integer WAV bit-exact.
//!
//! No resampling or channel mixing happens here; the separation engine sees
//! exactly what the file contains. Gapless info in LAME/Xing headers is
//! honoured, so MP3 encoder delay and padding are trimmed.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::engine::buffer::DecodedAudioBuffer;
use crate::engine::source::SourceAudio;
use crate::error::{KaraokeError, Result};

const WAV_MIME_TYPES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave", "audio/vnd.wave"];

/// A decode capability: compressed/container bytes in, planar PCM out.
pub trait AudioDecoder: Send + Sync {
    /// Decode the whole source into memory
    ///
    /// # Errors
    /// * `Decode` - the bytes are empty, not a recognised format, or corrupt
    fn decode(&self, source: &SourceAudio) -> Result<DecodedAudioBuffer>;
}

// ============================================================================
// Default routing decoder
// ============================================================================

/// Routes WAV input to [`WavDecoder`] and everything else to
/// [`SymphoniaDecoder`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecoder;

impl AudioDecoder for DefaultDecoder {
    fn decode(&self, source: &SourceAudio) -> Result<DecodedAudioBuffer> {
        ensure_not_empty(source)?;

        if is_wav(source) {
            match WavDecoder.decode(source) {
                Ok(buffer) => return Ok(buffer),
                // hound only reads PCM and IEEE float; symphonia covers the rest
                Err(e) => debug!("hound rejected WAV input ({}), retrying with symphonia", e),
            }
        }

        SymphoniaDecoder.decode(source)
    }
}

/// Check whether a source looks like RIFF/WAVE
pub fn is_wav(source: &SourceAudio) -> bool {
    let bytes = source.bytes();
    let has_magic = bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE";

    has_magic
        || WAV_MIME_TYPES.contains(&source.mime_type().to_ascii_lowercase().as_str())
        || source.extension().as_deref() == Some("wav")
}

fn ensure_not_empty(source: &SourceAudio) -> Result<()> {
    if source.is_empty() {
        return Err(KaraokeError::Decode {
            reason: "audio file is empty".to_string(),
            source: None,
        });
    }
    Ok(())
}

// ============================================================================
// WAV via hound
// ============================================================================

/// RIFF/WAVE decoder backed by `hound`
#[derive(Debug, Default, Clone, Copy)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, source: &SourceAudio) -> Result<DecodedAudioBuffer> {
        ensure_not_empty(source)?;

        let reader = WavReader::new(Cursor::new(source.bytes()))
            .map_err(|e| KaraokeError::decode(format!("failed to open WAV data: {}", e), e))?;

        let spec = reader.spec();
        debug!(
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            "decoding WAV"
        );

        let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
        DecodedAudioBuffer::from_interleaved(spec.sample_rate, spec.channels as usize, &samples)
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| {
        KaraokeError::decode(format!("failed to read {}-bit samples: {}", bits_per_sample, e), e)
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, bits) => Err(KaraokeError::Decode {
            reason: format!("{}-bit integer WAV is not supported", bits),
            source: None,
        }),
    }
}

// ============================================================================
// Everything else via symphonia
// ============================================================================

/// Multi-format decoder backed by `symphonia`
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, source: &SourceAudio) -> Result<DecodedAudioBuffer> {
        ensure_not_empty(source)?;

        let cursor = Cursor::new(source.bytes().to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.mime_type(source.mime_type());
        if let Some(ext) = source.extension() {
            hint.with_extension(&ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions {
                    enable_gapless: true,
                    ..Default::default()
                },
                &MetadataOptions::default(),
            )
            .map_err(|e| KaraokeError::decode(format!("unrecognised audio format: {}", e), e))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| KaraokeError::Decode {
                reason: "no decodable audio track".to_string(),
                source: None,
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| KaraokeError::decode(format!("unsupported codec: {}", e), e))?;

        let mut sample_rate = codec_params.sample_rate;
        let mut num_channels = codec_params.channels.map(|c| c.count());
        let mut interleaved: Vec<f32> = Vec::new();
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(KaraokeError::decode(format!("failed to read packet: {}", e), e))
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let packet_channels = spec.channels.count();

                    match num_channels {
                        Some(n) if n != packet_channels => {
                            return Err(KaraokeError::Decode {
                                reason: format!(
                                    "channel count changed mid-stream ({} -> {})",
                                    n, packet_channels
                                ),
                                source: None,
                            });
                        }
                        Some(_) => {}
                        None => num_channels = Some(packet_channels),
                    }
                    sample_rate.get_or_insert(spec.rate);

                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    interleaved.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(reason)) => {
                    skipped_packets += 1;
                    warn!(timestamp = packet.ts(), reason, "skipping corrupt packet");
                }
                Err(e) => return Err(KaraokeError::decode(format!("decode failed: {}", e), e)),
            }
        }

        let sample_rate = sample_rate.ok_or_else(|| KaraokeError::Decode {
            reason: "stream does not declare a sample rate".to_string(),
            source: None,
        })?;
        let num_channels = num_channels.unwrap_or(0);

        debug!(
            sample_rate,
            channels = num_channels,
            samples = interleaved.len(),
            skipped_packets,
            "symphonia decode finished"
        );

        DecodedAudioBuffer::from_interleaved(sample_rate, num_channels, &interleaved)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes(channels: u16, sample_rate: u32, frames: &[Vec<i16>]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for frame in frames {
                for &s in frame {
                    writer.write_sample(s).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_empty_input_is_decode_error() {
        let source = SourceAudio::new(Vec::new(), "audio/mp3");
        for result in [
            DefaultDecoder.decode(&source),
            WavDecoder.decode(&source),
            SymphoniaDecoder.decode(&source),
        ] {
            assert!(matches!(result, Err(KaraokeError::Decode { .. })));
        }
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let source = SourceAudio::new(b"definitely not audio data".to_vec(), "audio/mp3");
        let result = DefaultDecoder.decode(&source);
        assert!(matches!(result, Err(KaraokeError::Decode { .. })));
    }

    #[test]
    fn test_wav_decoder_reads_stereo() {
        let bytes = wav_bytes(2, 44100, &[vec![16384, -16384], vec![-32768, 0]]);
        let source = SourceAudio::new(bytes, "audio/wav");

        let buffer = WavDecoder.decode(&source).unwrap();
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.5, -1.0]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.5, 0.0]);
    }

    #[test]
    fn test_symphonia_decoder_reads_wav() {
        let bytes = wav_bytes(2, 22050, &[vec![8192, 0], vec![0, 8192], vec![0, 0]]);
        let source = SourceAudio::new(bytes, "audio/wav").with_file_name("clip.wav");

        let buffer = SymphoniaDecoder.decode(&source).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.frame_count(), 3);
        approx::assert_abs_diff_eq!(buffer.channel(0).unwrap()[0], 0.25, epsilon = 1e-4);
    }

    #[test]
    fn test_default_decoder_reads_mp3() {
        let bytes = include_bytes!("../../tests/fixtures/short_mono.mp3").to_vec();
        let source = SourceAudio::new(bytes, "audio/mpeg").with_file_name("short_mono.mp3");
        assert!(!is_wav(&source));

        let buffer = DefaultDecoder.decode(&source).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.num_channels(), 1);
        assert!(buffer.frame_count() > 22050, "got {} frames", buffer.frame_count());
    }

    #[test]
    fn test_is_wav_detection() {
        let bytes = wav_bytes(1, 8000, &[vec![0]]);
        assert!(is_wav(&SourceAudio::new(bytes, "application/octet-stream")));
        assert!(is_wav(&SourceAudio::new(vec![0; 4], "audio/x-wav")));
        assert!(is_wav(
            &SourceAudio::new(vec![0; 4], "").with_file_name("take.WAV")
        ));
        assert!(!is_wav(&SourceAudio::new(vec![0xFF, 0xFB, 0x90, 0x00], "audio/mp3")));
    }

    #[test]
    fn test_default_decoder_zero_frames() {
        let bytes = wav_bytes(2, 44100, &[]);
        let buffer = DefaultDecoder
            .decode(&SourceAudio::new(bytes, "audio/wav"))
            .unwrap();
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.num_channels(), 2);
    }
}
