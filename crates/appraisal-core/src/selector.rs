//! Bounded, quantized value selector.
//!
//! The selector stores its value as a step index from `min`, so the value
//! is always `min + index * step` with `0 <= index <= max_index`. Every
//! entry point (raw value, pointer position, keyboard step, Home/End)
//! funnels through [`ValueSelector::set_raw`], which rounds to the nearest
//! index (half-up) and clamps it. Out-of-range input is normalized, never
//! rejected.
//!
//! Once frozen (the round ended) all input is ignored until the next
//! [`ValueSelector::reset`].

use appraisal_types::{KeyInput, SliderBounds};

use crate::config::SliderConfig;

/// Continuous-drag value selector with keyboard stepping.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSelector {
    /// Legal domain and grid.
    bounds: SliderBounds,
    /// Arrow-key increment.
    keyboard_step: f64,
    /// Highest legal step index.
    max_index: u64,
    /// Current step index.
    index: u64,
    /// Whether input is ignored.
    frozen: bool,
    /// Whether a pointer drag is in progress.
    dragging: bool,
}

impl ValueSelector {
    /// Create a selector at `min`, accepting input.
    ///
    /// `config` is expected to have passed validation.
    pub fn new(config: &SliderConfig) -> Self {
        Self {
            bounds: config.bounds(),
            keyboard_step: config.keyboard_step,
            max_index: config.max_index(),
            index: 0,
            frozen: false,
            dragging: false,
        }
    }

    /// Current quantized value, always within `[min, max]`.
    pub fn value(&self) -> f64 {
        self.value_at(self.index)
    }

    /// Largest value on the grid (equal to `max` when the range is a
    /// multiple of `step`).
    pub fn grid_max(&self) -> f64 {
        self.value_at(self.max_index)
    }

    /// The selector's domain.
    pub const fn bounds(&self) -> SliderBounds {
        self.bounds
    }

    /// Whether input is currently ignored.
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether a pointer drag is in progress.
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Return to `min`, unfrozen, with no drag in progress.
    pub const fn reset(&mut self) {
        self.index = 0;
        self.frozen = false;
        self.dragging = false;
    }

    /// Ignore all further input and end any drag.
    pub const fn freeze(&mut self) {
        self.frozen = true;
        self.dragging = false;
    }

    /// Quantize and clamp `raw`, then store it.
    ///
    /// Returns the new value if it changed, `None` if frozen or unchanged.
    /// `NaN` leaves the value untouched; infinities clamp to the bounds.
    pub fn set_raw(&mut self, raw: f64) -> Option<f64> {
        if self.frozen {
            return None;
        }
        let index = self.quantize(raw);
        self.move_to(index)
    }

    /// Map a normalized track position onto the domain.
    ///
    /// The fraction is clamped into `[0, 1]` first so pointer coordinates
    /// outside the track are tolerated.
    pub fn from_pointer_position(&mut self, fraction: f64) -> Option<f64> {
        let fraction = fraction.clamp(0.0, 1.0);
        let raw = self.bounds.min + fraction * self.bounds.range();
        self.set_raw(raw)
    }

    /// Move by `delta` from the current value, then re-clamp.
    ///
    /// A non-zero `delta` always moves at least one grid step in its
    /// direction (unless already at that bound), so a `delta` smaller than
    /// half a step, or one that rounds back onto the current index, still
    /// moves the value.
    pub fn step_by(&mut self, delta: f64) -> Option<f64> {
        if self.frozen || delta.is_nan() {
            return None;
        }
        let mut index = self.quantize(self.value() + delta);
        if index == self.index {
            if delta > 0.0 {
                index = self.index.saturating_add(1).min(self.max_index);
            } else if delta < 0.0 {
                index = self.index.saturating_sub(1);
            }
        }
        self.move_to(index)
    }

    /// Apply a keyboard input.
    pub fn apply_key(&mut self, key: KeyInput) -> Option<f64> {
        match key {
            KeyInput::StepDown => self.step_by(-self.keyboard_step),
            KeyInput::StepUp => self.step_by(self.keyboard_step),
            KeyInput::Home => self.set_raw(self.bounds.min),
            KeyInput::End => self.set_raw(self.bounds.max),
        }
    }

    /// Begin a drag and jump to the pressed position.
    pub fn pointer_down(&mut self, fraction: f64) -> Option<f64> {
        if self.frozen {
            return None;
        }
        self.dragging = true;
        self.from_pointer_position(fraction)
    }

    /// Follow the pointer while a drag is in progress.
    pub fn pointer_move(&mut self, fraction: f64) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        self.from_pointer_position(fraction)
    }

    /// End the drag.
    pub const fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Store `index`, returning the new value if it changed.
    fn move_to(&mut self, index: u64) -> Option<f64> {
        if index == self.index {
            return None;
        }
        self.index = index;
        Some(self.value())
    }

    /// Value of grid point `index`, clamped into the bounds so float
    /// rounding of `index * step` cannot overshoot `max`.
    #[allow(clippy::cast_precision_loss)]
    fn value_at(&self, index: u64) -> f64 {
        (self.bounds.min + index as f64 * self.bounds.step).clamp(self.bounds.min, self.bounds.max)
    }

    /// Nearest step index to `raw`, rounding halves up, clamped to the grid.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn quantize(&self, raw: f64) -> u64 {
        let offset = (raw - self.bounds.min) / self.bounds.step;
        if offset.is_nan() {
            return self.index;
        }
        let rounded = (offset + 0.5).floor();
        if rounded <= 0.0 {
            0
        } else if rounded >= self.max_index as f64 {
            self.max_index
        } else {
            // In range (0, max_index), so the conversion is exact.
            rounded as u64
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn selector(min: f64, max: f64, step: f64) -> ValueSelector {
        ValueSelector::new(&SliderConfig {
            min,
            max,
            step,
            keyboard_step: 50.0,
        })
    }

    fn on_grid(sel: &ValueSelector) -> bool {
        let bounds = sel.bounds();
        let steps = (sel.value() - bounds.min) / bounds.step;
        (steps - steps.round()).abs() < 1e-6
    }

    #[test]
    fn raw_values_are_quantized_and_clamped() {
        let mut sel = selector(0.0, 12_000.0, 1.0);
        let inputs = [
            -1e12, -5.0, 0.0, 0.4, 0.5, 1.49, 2999.5, 6000.25, 11_999.6, 12_000.0, 1e12,
            f64::INFINITY, f64::NEG_INFINITY,
        ];
        for raw in inputs {
            sel.set_raw(raw);
            let v = sel.value();
            assert!((0.0..=12_000.0).contains(&v), "{raw} -> {v}");
            assert!(on_grid(&sel), "{raw} -> {v} is off grid");
        }
    }

    #[test]
    fn ties_round_half_up() {
        let mut sel = selector(0.0, 100.0, 10.0);
        sel.set_raw(15.0);
        assert_eq!(sel.value(), 20.0);
        sel.set_raw(24.9);
        assert_eq!(sel.value(), 20.0);
        sel.set_raw(25.0);
        assert_eq!(sel.value(), 30.0);
    }

    #[test]
    fn grid_is_anchored_at_min() {
        let mut sel = selector(5.0, 105.0, 10.0);
        sel.set_raw(32.0);
        assert_eq!(sel.value(), 35.0);
        sel.set_raw(1000.0);
        assert_eq!(sel.value(), 105.0);
    }

    #[test]
    fn uneven_range_clamps_to_last_grid_point() {
        let mut sel = selector(0.0, 10.0, 3.0);
        sel.set_raw(10.0);
        assert_eq!(sel.value(), 9.0);
        assert_eq!(sel.grid_max(), 9.0);
        assert_eq!(sel.apply_key(KeyInput::Home), Some(0.0));
    }

    #[test]
    fn fractional_step_never_leaves_bounds() {
        let config = SliderConfig {
            min: 0.0,
            max: 3.3,
            step: 1.1,
            keyboard_step: 1.1,
        };
        let mut sel = ValueSelector::new(&config);
        assert!(sel.grid_max() <= 3.3);

        let check = |sel: &ValueSelector| {
            let v = sel.value();
            assert!((0.0..=3.3).contains(&v), "value {v} outside [0, 3.3]");
        };
        sel.apply_key(KeyInput::End);
        check(&sel);
        assert_eq!(sel.value(), 3.3);
        sel.apply_key(KeyInput::Home);
        check(&sel);
        for raw in [f64::INFINITY, f64::NEG_INFINITY, 3.29, 1e9, -1e9] {
            sel.set_raw(raw);
            check(&sel);
        }
        for _ in 0..5 {
            sel.apply_key(KeyInput::StepUp);
            check(&sel);
        }
        assert_eq!(sel.from_pointer_position(1.0), None);
        check(&sel);
    }

    #[test]
    fn keyboard_step_below_grid_still_moves_both_ways() {
        let mut sel = ValueSelector::new(&SliderConfig {
            min: 0.0,
            max: 1000.0,
            step: 100.0,
            keyboard_step: 50.0,
        });
        assert_eq!(sel.apply_key(KeyInput::StepUp), Some(100.0));
        assert_eq!(sel.apply_key(KeyInput::StepUp), Some(200.0));
        assert_eq!(sel.apply_key(KeyInput::StepDown), Some(100.0));
        assert_eq!(sel.apply_key(KeyInput::StepDown), Some(0.0));
        assert_eq!(sel.apply_key(KeyInput::StepDown), None);
        sel.apply_key(KeyInput::End);
        assert_eq!(sel.apply_key(KeyInput::StepUp), None);
        assert_eq!(sel.value(), 1000.0);
    }

    #[test]
    fn nan_is_ignored() {
        let mut sel = selector(0.0, 100.0, 1.0);
        sel.set_raw(42.0);
        assert_eq!(sel.set_raw(f64::NAN), None);
        assert_eq!(sel.value(), 42.0);
    }

    #[test]
    fn pointer_fraction_is_clamped_before_mapping() {
        let mut sel = selector(0.0, 12_000.0, 1.0);
        assert_eq!(sel.from_pointer_position(0.25), Some(3000.0));
        assert_eq!(sel.from_pointer_position(1.7), Some(12_000.0));
        assert_eq!(sel.from_pointer_position(-0.3), Some(0.0));
    }

    #[test]
    fn keyboard_steps_by_fixed_increment() {
        let mut sel = selector(0.0, 12_000.0, 1.0);
        assert_eq!(sel.apply_key(KeyInput::StepUp), Some(50.0));
        assert_eq!(sel.apply_key(KeyInput::StepUp), Some(100.0));
        assert_eq!(sel.apply_key(KeyInput::StepDown), Some(50.0));
        assert_eq!(sel.apply_key(KeyInput::End), Some(12_000.0));
        assert_eq!(sel.apply_key(KeyInput::StepUp), None);
        assert_eq!(sel.apply_key(KeyInput::Home), Some(0.0));
        assert_eq!(sel.apply_key(KeyInput::StepDown), None);
        assert_eq!(sel.value(), 0.0);
    }

    #[test]
    fn drag_only_moves_while_pressed() {
        let mut sel = selector(0.0, 1000.0, 1.0);
        assert_eq!(sel.pointer_move(0.5), None);
        assert_eq!(sel.pointer_down(0.1), Some(100.0));
        assert!(sel.is_dragging());
        assert_eq!(sel.pointer_move(0.2), Some(200.0));
        sel.pointer_up();
        assert_eq!(sel.pointer_move(0.9), None);
        assert_eq!(sel.value(), 200.0);
    }

    #[test]
    fn frozen_selector_ignores_every_entry_point() {
        let mut sel = selector(0.0, 1000.0, 1.0);
        sel.pointer_down(0.5);
        sel.freeze();
        assert!(!sel.is_dragging());
        assert_eq!(sel.set_raw(10.0), None);
        assert_eq!(sel.pointer_down(0.9), None);
        assert_eq!(sel.pointer_move(0.9), None);
        assert_eq!(sel.apply_key(KeyInput::End), None);
        assert_eq!(sel.value(), 500.0);

        sel.reset();
        assert!(!sel.is_frozen());
        assert_eq!(sel.value(), 0.0);
    }
}
