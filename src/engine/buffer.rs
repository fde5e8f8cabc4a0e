//! Audio Buffer Types
//!
//! Decoded multi-channel PCM and the mono difference signal produced by
//! separation. Samples are 32-bit float, nominally in [-1.0, 1.0] but never
//! clamped here.

use crate::error::{KaraokeError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Absolute peak of a sample slice (0.0 for an empty slice)
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

// ============================================================================
// Decoded Audio
// ============================================================================

/// Planar PCM produced by a decoder, at the source's native sample rate.
///
/// All channels hold exactly `frame_count` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudioBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// * `Decode` - zero sample rate, no channels, or channels of unequal length
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(KaraokeError::Decode {
                reason: "decoder reported a sample rate of 0 Hz".to_string(),
                source: None,
            });
        }

        let Some(first) = channels.first() else {
            return Err(KaraokeError::Decode {
                reason: "decoder produced no audio channels".to_string(),
                source: None,
            });
        };

        let frames = first.len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(KaraokeError::Decode {
                reason: format!(
                    "channel {} has {} frames, expected {}",
                    idx,
                    ch.len(),
                    frames
                ),
                source: None,
            });
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Create a buffer by de-interleaving [L,R,L,R,...] samples
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, num_channels: usize, samples: &[f32]) -> Result<Self> {
        if num_channels == 0 {
            return Err(KaraokeError::Decode {
                reason: "decoder produced no audio channels".to_string(),
                source: None,
            });
        }
        Self::new(sample_rate, deinterleave(samples, num_channels))
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (always at least 1)
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, if it exists
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels in order
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }
}

// ============================================================================
// Mono Output
// ============================================================================

/// Single-channel output of the separation engine
#[derive(Debug, Clone, PartialEq)]
pub struct MonoBuffer {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl MonoBuffer {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
pub(crate) fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            result[ch].push(sample);
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let interleaved = vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0];
        let channels = deinterleave(&interleaved, 2);
        assert_eq!(channels[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(channels[1], vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_deinterleave_drops_partial_frame() {
        let channels = deinterleave(&[0.1, 0.2, 0.3], 2);
        assert_eq!(channels[0], vec![0.1]);
        assert_eq!(channels[1], vec![0.2]);
    }

    #[test]
    fn test_rejects_unequal_channels() {
        let result = DecodedAudioBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]);
        assert!(matches!(result, Err(KaraokeError::Decode { .. })));
    }

    #[test]
    fn test_rejects_zero_rate_and_no_channels() {
        assert!(DecodedAudioBuffer::new(0, vec![vec![0.0]]).is_err());
        assert!(DecodedAudioBuffer::new(44100, Vec::new()).is_err());
        assert!(DecodedAudioBuffer::from_interleaved(44100, 0, &[]).is_err());
    }

    #[test]
    fn test_accessors() {
        let buffer = DecodedAudioBuffer::from_interleaved(48000, 2, &[0.5, -0.5, 0.25, -0.25])
            .unwrap();
        assert_eq!(buffer.sample_rate(), 48000);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(1), Some(&[-0.5, -0.25][..]));
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn test_peak_and_db() {
        assert_eq!(peak(&[]), 0.0);
        assert_eq!(peak(&[0.25, -1.5, 0.5]), 1.5);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
        assert!(linear_to_db(1.0).abs() < 1e-6);
    }
}
