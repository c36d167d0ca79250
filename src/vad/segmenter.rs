//! Splits a stream of fixed-size audio chunks into utterances.
//!
//! The first second of audio calibrates the energy threshold. After that an
//! utterance opens on the first loud chunk (keeping one chunk of pre-roll)
//! and closes after a run of quiet chunks, or when it hits the length cap.

use std::mem;

use super::chunk_energy;

/// Chunk counts assume 80 ms chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterConfig {
    /// Chunks of ambient noise to average before listening (~1 s).
    pub calibration_chunks: usize,
    /// Threshold = ambient energy * ratio.
    pub ambient_ratio: f32,
    /// Floor for the threshold in a silent room.
    pub min_threshold: f32,
    /// Quiet chunks that end an utterance (~0.8 s).
    pub pause_chunks: usize,
    /// Loud chunks required to keep an utterance (~0.3 s).
    pub min_speech_chunks: usize,
    /// Hard cap on utterance length (~15 s).
    pub max_chunks: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            calibration_chunks: 13,
            ambient_ratio: 1.5,
            min_threshold: 0.01,
            pause_chunks: 10,
            min_speech_chunks: 4,
            max_chunks: 188,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEvent {
    Calibrated { threshold: f32 },
    SpeechStarted,
    /// A complete utterance, pre-roll included.
    Utterance(Vec<f32>),
    /// Speech that was too short to be a command.
    Discarded,
}

#[derive(Debug)]
pub struct UtteranceSegmenter {
    config: SegmenterConfig,
    threshold: Option<f32>,
    ambient_sum: f32,
    ambient_chunks: usize,
    pre_roll: Vec<f32>,
    recording: Vec<f32>,
    active: bool,
    speech_chunks: usize,
    silence_run: usize,
    total_chunks: usize,
}

impl UtteranceSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            threshold: None,
            ambient_sum: 0.0,
            ambient_chunks: 0,
            pre_roll: Vec::new(),
            recording: Vec::new(),
            active: false,
            speech_chunks: 0,
            silence_run: 0,
            total_chunks: 0,
        }
    }

    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    /// Feed one chunk. Returns an event when something changed.
    pub fn push(&mut self, chunk: &[f32]) -> Option<SegmentEvent> {
        let energy = chunk_energy(chunk);

        let Some(threshold) = self.threshold else {
            return self.calibrate(energy);
        };
        let loud = energy > threshold;

        if !self.active {
            if !loud {
                self.pre_roll.clear();
                self.pre_roll.extend_from_slice(chunk);
                return None;
            }
            self.active = true;
            self.recording = mem::take(&mut self.pre_roll);
            self.recording.extend_from_slice(chunk);
            self.speech_chunks = 1;
            self.silence_run = 0;
            self.total_chunks = 1;
            return Some(SegmentEvent::SpeechStarted);
        }

        self.recording.extend_from_slice(chunk);
        self.total_chunks += 1;
        if loud {
            self.speech_chunks += 1;
            self.silence_run = 0;
        } else {
            self.silence_run += 1;
        }

        if self.silence_run >= self.config.pause_chunks || self.total_chunks >= self.config.max_chunks {
            return Some(self.finish());
        }
        None
    }

    /// Drop any utterance in progress; calibration is kept.
    pub fn reset(&mut self) {
        self.active = false;
        self.pre_roll.clear();
        self.recording.clear();
        self.speech_chunks = 0;
        self.silence_run = 0;
        self.total_chunks = 0;
    }

    fn calibrate(&mut self, energy: f32) -> Option<SegmentEvent> {
        self.ambient_sum += energy;
        self.ambient_chunks += 1;
        if self.ambient_chunks < self.config.calibration_chunks {
            return None;
        }
        let ambient = self.ambient_sum / self.ambient_chunks as f32;
        let threshold = (ambient * self.config.ambient_ratio).max(self.config.min_threshold);
        self.threshold = Some(threshold);
        Some(SegmentEvent::Calibrated { threshold })
    }

    fn finish(&mut self) -> SegmentEvent {
        let audio = mem::take(&mut self.recording);
        let long_enough = self.speech_chunks >= self.config.min_speech_chunks;
        self.reset();
        if long_enough {
            SegmentEvent::Utterance(audio)
        } else {
            SegmentEvent::Discarded
        }
    }
}
