//! Audio Engine Module
//!
//! The vocal-attenuation kernel:
//! - Source audio and decoding to planar PCM
//! - Channel-difference separation
//! - Canonical 16-bit WAV encoding

pub mod buffer;
pub mod decode;
pub mod separation;
pub mod source;
pub mod wav;

pub use buffer::{DecodedAudioBuffer, MonoBuffer};
pub use decode::{AudioDecoder, DefaultDecoder, SymphoniaDecoder, WavDecoder};
pub use separation::{center_cancel, separate, SeparationReport};
pub use source::SourceAudio;
pub use wav::{encode_wav, float_to_pcm16, ByteWriter, EncodedContainer, WavHeader};
