//! Vocal-attenuation pipeline
//!
//! Decode → separate → encode, strictly in that order, once per run. The
//! run owns every buffer it creates; nothing is shared between runs. A
//! failure at any stage aborts the run before a container exists.

use std::time::Instant;

use tracing::{debug, info};

use crate::engine::{
    encode_wav, separate, AudioDecoder, DefaultDecoder, EncodedContainer, SeparationReport,
    SourceAudio,
};
use crate::error::Result;
use crate::lyrics::AudioData;

/// Everything a completed run hands back to the caller
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Song title the run was labelled with
    pub title: String,
    /// The instrumental, ready for playback or download
    pub container: EncodedContainer,
    pub report: SeparationReport,
    /// The original, unprocessed upload for the lyrics request
    pub transcription_audio: AudioData,
}

/// The decode/separate/encode chain with a pluggable decoder
pub struct Pipeline {
    decoder: Box<dyn AudioDecoder>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pipeline using [`DefaultDecoder`]
    pub fn new() -> Self {
        Self::with_decoder(DefaultDecoder)
    }

    pub fn with_decoder<D: AudioDecoder + 'static>(decoder: D) -> Self {
        Self {
            decoder: Box::new(decoder),
        }
    }

    /// Produce the instrumental container for one source
    ///
    /// # Errors
    /// * `Decode` - the source could not be decoded
    /// * `InvalidContainer` - the result is too long for a WAV file
    pub fn instrumental(&self, source: &SourceAudio) -> Result<(EncodedContainer, SeparationReport)> {
        let start = Instant::now();

        let decoded = self.decoder.decode(source)?;
        debug!(
            sample_rate = decoded.sample_rate(),
            channels = decoded.num_channels(),
            frames = decoded.frame_count(),
            duration_secs = decoded.duration_secs(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decoded"
        );

        let (mono, report) = separate(&decoded);
        drop(decoded);

        let container = encode_wav(&mono)?;
        info!(
            frames = report.frame_count,
            bytes = container.len(),
            mono_source = report.mono_source,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "instrumental ready"
        );

        Ok((container, report))
    }

    /// Run the full pipeline and package the result with the lyrics payload
    pub fn process(&self, source: &SourceAudio, title: &str) -> Result<PipelineOutput> {
        let (container, report) = self.instrumental(source)?;
        Ok(PipelineOutput {
            title: title.to_string(),
            container,
            report,
            transcription_audio: source.transcription_audio(),
        })
    }
}

/// Pipeline entry point: raw file bytes plus declared MIME type and song
/// title in, instrumental WAV plus the lyrics payload out.
pub fn process_audio(bytes: Vec<u8>, mime_type: &str, title: &str) -> Result<PipelineOutput> {
    Pipeline::new().process(&SourceAudio::new(bytes, mime_type), title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DecodedAudioBuffer;
    use crate::error::KaraokeError;
    use pretty_assertions::assert_eq;

    /// Decoder that ignores the bytes and returns a fixed buffer
    struct FixedDecoder(DecodedAudioBuffer);

    impl AudioDecoder for FixedDecoder {
        fn decode(&self, _source: &SourceAudio) -> Result<DecodedAudioBuffer> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_reference_scenario() {
        let buffer = DecodedAudioBuffer::new(
            44100,
            vec![vec![0.5, -0.5, 1.0, -1.0], vec![0.5, -0.5, -1.0, 1.0]],
        )
        .unwrap();
        let pipeline = Pipeline::with_decoder(FixedDecoder(buffer));

        let output = pipeline
            .process(&SourceAudio::new(vec![1, 2, 3], "audio/mp3"), "Demo")
            .unwrap();

        assert_eq!(output.container.len(), 52);
        assert_eq!(
            output.container.samples().collect::<Vec<_>>(),
            vec![0, 0, 32767, -32768]
        );
        assert_eq!(output.report.peak, 2.0);
        assert_eq!(output.title, "Demo");
        assert_eq!(output.transcription_audio.base64, "AQID");
        assert_eq!(output.transcription_audio.mime_type, "audio/mp3");
    }

    #[test]
    fn test_decode_failure_produces_no_container() {
        let result = process_audio(b"not audio".to_vec(), "audio/mp3", "x");
        assert!(matches!(result, Err(KaraokeError::Decode { .. })));
    }

    #[test]
    fn test_empty_bytes_fail() {
        let result = process_audio(Vec::new(), "audio/wav", "x");
        assert!(matches!(result, Err(KaraokeError::Decode { .. })));
    }
}
