//! Push-button debouncing sampled once per tick.
//!
//! A press has to be seen on [`DEBOUNCE_TICKS`] consecutive ticks before the
//! button counts as held. A held button fires once on its first held tick,
//! then stays quiet until it has been held for [`REPEAT_DELAY_TICKS`] and
//! fires on every tick after that. Releasing resets everything at once.

use core::convert::Infallible;

use embedded_hal::digital::InputPin;

/// Consecutive pressed ticks before a press is accepted.
pub const DEBOUNCE_TICKS: u8 = 10;

/// Held ticks before auto-repeat starts.
pub const REPEAT_DELAY_TICKS: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    Idle,
    Debouncing,
    Held,
}

/// Debounce state of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    raw_pressed: bool,
    consecutive_ticks: u8,
    pressed_debounced: bool,
    /// Ticks spent held, 1 on the first held tick.
    hold_ticks: u16,
}

impl ButtonState {
    pub const fn new() -> Self {
        Self {
            raw_pressed: false,
            consecutive_ticks: 0,
            pressed_debounced: false,
            hold_ticks: 0,
        }
    }

    /// Feed one raw sample; returns `true` when this tick should act.
    pub fn update(&mut self, raw_pressed: bool) -> bool {
        self.raw_pressed = raw_pressed;
        if !raw_pressed {
            *self = Self::new();
            return false;
        }

        self.consecutive_ticks = self.consecutive_ticks.saturating_add(1);
        if self.consecutive_ticks >= DEBOUNCE_TICKS {
            self.pressed_debounced = true;
            self.hold_ticks = self.hold_ticks.saturating_add(1);
        }
        self.fires()
    }

    fn fires(&self) -> bool {
        self.pressed_debounced && (self.hold_ticks == 1 || self.hold_ticks >= REPEAT_DELAY_TICKS)
    }

    pub fn state(&self) -> DebounceState {
        if self.pressed_debounced {
            DebounceState::Held
        } else if self.raw_pressed {
            DebounceState::Debouncing
        } else {
            DebounceState::Idle
        }
    }

    pub fn is_held(&self) -> bool {
        self.pressed_debounced
    }

    pub fn hold_ticks(&self) -> u16 {
        self.hold_ticks
    }
}

/// A button input pin with its debounce state.
pub struct Button<P> {
    pin: P,
    active_low: bool,
    state: ButtonState,
}

impl<P> Button<P>
where
    P: InputPin<Error = Infallible>,
{
    /// Button pulled up and shorted to ground when pressed.
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
            state: ButtonState::new(),
        }
    }

    /// Button pulled down and driven high when pressed.
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
            state: ButtonState::new(),
        }
    }

    /// Read the pin once and advance the debounce state.
    pub fn sample(&mut self) -> Result<bool, Infallible> {
        let pressed = self.pin.is_low()? == self.active_low;
        Ok(self.state.update(pressed))
    }

    pub fn state(&self) -> &ButtonState {
        &self.state
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInput;

    /// Feed `pattern` and return the 1-based ticks that fired.
    fn fired_ticks(state: &mut ButtonState, pattern: impl IntoIterator<Item = bool>) -> Vec<usize> {
        pattern
            .into_iter()
            .enumerate()
            .filter_map(|(i, pressed)| state.update(pressed).then_some(i + 1))
            .collect()
    }

    #[test]
    fn test_short_press_never_holds() {
        let mut state = ButtonState::new();
        let pattern = core::iter::repeat_n(true, 9).chain([false]);
        assert!(fired_ticks(&mut state, pattern).is_empty());
        assert_eq!(state.state(), DebounceState::Idle);
    }

    #[test]
    fn test_holds_and_fires_on_tenth_tick() {
        let mut state = ButtonState::new();
        for tick in 1..DEBOUNCE_TICKS {
            assert!(!state.update(true), "fired early at tick {tick}");
            assert_eq!(state.state(), DebounceState::Debouncing);
        }
        assert!(state.update(true));
        assert_eq!(state.state(), DebounceState::Held);
        assert_eq!(state.hold_ticks(), 1);
    }

    #[test]
    fn test_auto_repeat_after_delay() {
        let mut state = ButtonState::new();
        let debounce = usize::from(DEBOUNCE_TICKS);
        let fired = fired_ticks(&mut state, core::iter::repeat_n(true, debounce - 1 + 105));

        // Hold counts 1 and 100..=105.
        let mut expected = vec![debounce];
        expected.extend((100..=105).map(|hold| debounce - 1 + hold));
        assert_eq!(fired, expected);
    }

    #[test]
    fn test_quiet_between_first_and_repeat() {
        let mut state = ButtonState::new();
        for _ in 0..DEBOUNCE_TICKS {
            state.update(true);
        }
        for hold in 2..REPEAT_DELAY_TICKS {
            assert!(!state.update(true), "fired at hold count {hold}");
        }
        assert!(state.update(true));
        assert_eq!(state.hold_ticks(), REPEAT_DELAY_TICKS);
    }

    #[test]
    fn test_release_resets_immediately() {
        let mut state = ButtonState::new();
        for _ in 0..DEBOUNCE_TICKS {
            state.update(true);
        }
        assert!(state.is_held());

        assert!(!state.update(false));
        assert_eq!(state, ButtonState::new());

        // A fresh press needs the full debounce again.
        let fired = fired_ticks(&mut state, core::iter::repeat_n(true, 10));
        assert_eq!(fired, vec![10]);
    }

    #[test]
    fn test_bounce_restarts_debounce() {
        let mut state = ButtonState::new();
        let pattern = core::iter::repeat_n(true, 6)
            .chain([false])
            .chain(core::iter::repeat_n(true, 10));
        assert_eq!(fired_ticks(&mut state, pattern), vec![17]);
    }

    #[test]
    fn test_long_hold_keeps_repeating() {
        let mut state = ButtonState::new();
        for _ in 0..(u32::from(u16::MAX) + 50) {
            state.update(true);
        }
        assert_eq!(state.hold_ticks(), u16::MAX);
        assert!(state.update(true));
    }

    #[test]
    fn test_button_polarity() {
        let low = MockInput::new(false);
        let mut pull_up = Button::active_low(low.clone());
        let mut pull_down = Button::active_high(low.clone());

        for _ in 0..DEBOUNCE_TICKS {
            pull_up.sample().unwrap();
            pull_down.sample().unwrap();
        }
        assert!(pull_up.state().is_held());
        assert_eq!(pull_down.state().state(), DebounceState::Idle);

        low.set_high(true);
        pull_up.sample().unwrap();
        assert_eq!(pull_up.state().state(), DebounceState::Idle);
    }
}
