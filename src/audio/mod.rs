//! Audio capture, listener state, sample queue and track output.

pub mod capture;
pub mod output;
pub mod ring_buffer;
pub mod state;

pub use capture::{list_input_devices, list_output_devices, start_capture};
pub use output::{open_default_output, AudioOutput};
pub use ring_buffer::sample_queue;
pub use state::{ListenerState, ListenerStateMachine};
