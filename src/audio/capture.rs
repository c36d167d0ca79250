//! Microphone capture via cpal.
//!
//! Opens the default (or named) input device at its native format, converts
//! to 16 kHz mono f32, and pushes fixed-size chunks into the sample queue.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use super::ring_buffer::SampleProducer;

/// Sample rate the listener and the STT upload work at.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// 80 ms at 16 kHz.
pub const CHUNK_SAMPLES: usize = 1280;

pub fn list_input_devices() -> Vec<String> {
    device_names(cpal::default_host().input_devices())
}

pub fn list_output_devices() -> Vec<String> {
    device_names(cpal::default_host().output_devices())
}

fn device_names<I>(devices: Result<I, cpal::DevicesError>) -> Vec<String>
where
    I: Iterator<Item = cpal::Device>,
{
    devices
        .map(|iter| iter.filter_map(|dev| dev.name().ok()).collect())
        .unwrap_or_default()
}

fn resolve_device(device_name: Option<&str>) -> anyhow::Result<(cpal::Device, StreamConfig)> {
    let host = cpal::default_host();

    let device = match device_name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow::anyhow!("Input device not found: {name}"))?,
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No default input device available"))?,
    };

    let default_config = device.default_input_config()?;
    let stream_config = default_config.config();

    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        native_rate = stream_config.sample_rate.0,
        channels = stream_config.channels,
        "Selected input device"
    );

    Ok((device, stream_config))
}

/// Linear resampler for mono f32 samples.
pub(crate) fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    (0..out_len)
        .map(|i| {
            let src_idx = i as f64 * ratio;
            let idx0 = src_idx.floor() as usize;
            let frac = (src_idx - idx0 as f64) as f32;
            let s0 = input.get(idx0).copied().unwrap_or(0.0);
            let s1 = input.get(idx0 + 1).copied().unwrap_or(s0);
            s0 + frac * (s1 - s0)
        })
        .collect()
}

/// Average interleaved channels down to mono.
pub(crate) fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Start capturing. The returned stream must be kept alive on the calling
/// thread; dropping it stops capture.
pub fn start_capture(mut producer: SampleProducer, device_name: Option<&str>) -> anyhow::Result<Stream> {
    let (device, stream_config) = resolve_device(device_name)?;
    let native_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels;

    let mut pending: Vec<f32> = Vec::with_capacity(CHUNK_SAMPLES * 2);

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _info: &cpal::InputCallbackInfo| {
            let mono = to_mono(data, channels);
            pending.extend(resample_linear(&mono, native_rate, TARGET_SAMPLE_RATE));
            while pending.len() >= CHUNK_SAMPLES {
                // A full queue drops the chunk; the listener catches up.
                producer.push_slice(&pending[..CHUNK_SAMPLES]);
                pending.drain(..CHUNK_SAMPLES);
            }
        },
        move |err| {
            error!("Audio input stream error: {}", err);
        },
        None,
    )?;

    stream.play()?;
    info!("Audio capture started");

    Ok(stream)
}
