//! Channel-Difference Separation
//!
//! Center-channel cancellation: `output[i] = left[i] - right[i]`. Anything
//! mixed identically into both channels (usually lead vocals, often kick and
//! bass) cancels; anything that differs between channels survives.
//!
//! This is a heuristic, not source separation. Mono input has identical
//! "channels" by construction and therefore comes out silent.

use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::buffer::{peak, DecodedAudioBuffer, MonoBuffer};

/// What happened during one separation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparationReport {
    /// Frames in both input and output
    pub frame_count: usize,
    /// Channels in the decoded source
    pub source_channels: usize,
    /// Channels beyond the first two, which take no part in the difference
    pub ignored_channels: usize,
    /// Source had a single channel, so the output is silent
    pub mono_source: bool,
    /// Absolute peak of the difference signal before any clamping
    pub peak: f32,
}

impl SeparationReport {
    /// The difference exceeds full scale and will be clipped on encode
    pub fn will_clip(&self) -> bool {
        self.peak > 1.0
    }
}

/// Subtract the right channel from the left.
///
/// A single-channel source is used as both left and right; channels past the
/// second are ignored. The output is not clamped and may span [-2.0, 2.0].
pub fn center_cancel(buffer: &DecodedAudioBuffer) -> MonoBuffer {
    let channels = buffer.channels();
    let left = &channels[0];
    let right = channels.get(1).unwrap_or(left);

    let mut output = Vec::with_capacity(buffer.frame_count());
    output.extend(left.iter().zip(right.iter()).map(|(l, r)| l - r));

    MonoBuffer::new(buffer.sample_rate(), output)
}

/// Run [`center_cancel`] and describe the result.
pub fn separate(buffer: &DecodedAudioBuffer) -> (MonoBuffer, SeparationReport) {
    let source_channels = buffer.num_channels();
    let mono_source = source_channels == 1;

    if mono_source {
        warn!("source audio is mono; center-channel cancellation will produce silence");
    }
    if source_channels > 2 {
        debug!(
            ignored = source_channels - 2,
            "using only the first two channels"
        );
    }

    let output = center_cancel(buffer);
    let report = SeparationReport {
        frame_count: output.frame_count(),
        source_channels,
        ignored_channels: source_channels.saturating_sub(2),
        mono_source,
        peak: peak(output.samples()),
    };

    (output, report)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stereo(left: Vec<f32>, right: Vec<f32>) -> DecodedAudioBuffer {
        DecodedAudioBuffer::new(44100, vec![left, right]).unwrap()
    }

    #[test]
    fn test_difference_per_sample() {
        let left = vec![0.5, -0.25, 0.75, 0.0, 1.0];
        let right = vec![0.25, -0.25, -0.25, 0.5, -1.0];
        let buffer = stereo(left.clone(), right.clone());

        let output = center_cancel(&buffer);
        assert_eq!(output.frame_count(), left.len());
        for i in 0..left.len() {
            assert_eq!(output.samples()[i], left[i] - right[i]);
        }
    }

    #[test]
    fn test_identical_channels_cancel() {
        let signal: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let output = center_cancel(&stereo(signal.clone(), signal));
        assert!(output.is_silent());
    }

    #[test]
    fn test_mono_source_is_silent_for_all_lengths() {
        for frames in [0usize, 1, 2, 17, 1024] {
            let samples: Vec<f32> = (0..frames).map(|i| (i as f32 * 0.37).cos()).collect();
            let buffer = DecodedAudioBuffer::new(22050, vec![samples]).unwrap();

            let (output, report) = separate(&buffer);
            assert_eq!(output.frame_count(), frames);
            assert!(output.is_silent());
            assert!(report.mono_source);
            assert_eq!(report.peak, 0.0);
        }
    }

    #[test]
    fn test_extra_channels_ignored() {
        let buffer = DecodedAudioBuffer::new(
            48000,
            vec![
                vec![1.0, 0.5],
                vec![0.5, 0.5],
                vec![9.0, 9.0],
                vec![-9.0, -9.0],
            ],
        )
        .unwrap();

        let (output, report) = separate(&buffer);
        assert_eq!(output.samples(), &[0.5, 0.0]);
        assert_eq!(report.source_channels, 4);
        assert_eq!(report.ignored_channels, 2);
        assert!(!report.mono_source);
    }

    #[test]
    fn test_output_not_clamped() {
        let (output, report) = separate(&stereo(vec![1.0, -1.0], vec![-1.0, 1.0]));
        assert_eq!(output.samples(), &[2.0, -2.0]);
        assert_eq!(report.peak, 2.0);
        assert!(report.will_clip());
    }

    #[test]
    fn test_sample_rate_inherited() {
        let buffer = DecodedAudioBuffer::new(96000, vec![vec![0.0; 3], vec![0.0; 3]]).unwrap();
        assert_eq!(center_cancel(&buffer).sample_rate(), 96000);
    }

    #[test]
    fn test_deterministic() {
        let buffer = stereo(vec![0.3, -0.7, 0.1], vec![0.2, 0.4, -0.6]);
        assert_eq!(center_cancel(&buffer), center_cancel(&buffer));
    }
}
