//! Voice activity detection and utterance segmentation.
//!
//! Speech is anything louder than a threshold derived from the ambient noise
//! measured when the listener starts.

pub mod segmenter;

pub use segmenter::{SegmentEvent, SegmenterConfig, UtteranceSegmenter};

/// Mean absolute amplitude of a chunk, a cheap proxy for signal energy.
pub fn chunk_energy(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    chunk.iter().map(|s| s.abs()).sum::<f32>() / chunk.len() as f32
}
