//! Cabin temperature controller.
//!
//! There are no comfort bounds: any integer is accepted. Arithmetic saturates
//! at the `i32` limits rather than overflowing.

use super::DeviceState;

/// Step applied by the increase / decrease intents and the display buttons.
pub const STEP: i32 = 1;

/// Replace the temperature unconditionally. Returns the new value.
pub fn set_temperature(state: &mut DeviceState, value: i32) -> i32 {
    state.temperature = value;
    state.temperature
}

/// Move the temperature by `delta`. Returns the new value.
pub fn adjust_temperature(state: &mut DeviceState, delta: i32) -> i32 {
    state.temperature = state.temperature.saturating_add(delta);
    state.temperature
}
