//! Lock-free SPSC sample queue between the cpal callback and the listener.

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};

/// ~10 seconds of 16 kHz mono audio.
pub const DEFAULT_CAPACITY: usize = 160_000;

/// Writer half, owned by the cpal input callback.
pub struct SampleProducer {
    inner: ringbuf::HeapProd<f32>,
}

/// Reader half, owned by the listener thread.
pub struct SampleConsumer {
    inner: ringbuf::HeapCons<f32>,
}

pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let (prod, cons) = HeapRb::<f32>::new(capacity).split();
    (SampleProducer { inner: prod }, SampleConsumer { inner: cons })
}

impl SampleProducer {
    /// Returns how many samples fit. Overflow is dropped.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }
}

impl SampleConsumer {
    pub fn available(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Fill `chunk` completely, or leave the queue untouched and return false.
    pub fn pop_chunk(&mut self, chunk: &mut [f32]) -> bool {
        if self.available() < chunk.len() {
            return false;
        }
        self.inner.pop_slice(chunk) == chunk.len()
    }

    /// Discard everything queued so far.
    pub fn clear(&mut self) -> usize {
        self.inner.skip(self.available())
    }
}
