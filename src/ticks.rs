//! Millisecond timebase shared between the timer interrupt and the main thread.

use core::cell::Cell;

use critical_section::Mutex;

/// Length of one tick in milliseconds.
pub const TICK_PERIOD_MS: u16 = 1;

/// Wrapping 16-bit tick counter.
///
/// The timer interrupt calls [`TickCounter::advance`] once per period. Reads
/// take a critical section sized to the read itself so a 16-bit update is
/// never observed half written.
pub struct TickCounter {
    count: Mutex<Cell<u16>>,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(value: u16) -> Self {
        Self {
            count: Mutex::new(Cell::new(value)),
        }
    }

    /// Count one elapsed period, returning the new value.
    pub fn advance(&self) -> u16 {
        critical_section::with(|cs| {
            let cell = self.count.borrow(cs);
            let next = cell.get().wrapping_add(1);
            cell.set(next);
            next
        })
    }

    pub fn now(&self) -> u16 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    /// Ticks since `snapshot`, correct across one wraparound.
    pub fn elapsed_since(&self, snapshot: u16) -> u16 {
        self.now().wrapping_sub(snapshot)
    }

    /// Busy-wait until at least `milliseconds` have elapsed.
    ///
    /// Interrupts stay enabled between reads; the counter must be advanced
    /// by the timer interrupt or this never returns.
    pub fn wait_ms(&self, milliseconds: u16) {
        let start = self.now();
        let ticks = milliseconds.div_ceil(TICK_PERIOD_MS);
        while self.elapsed_since(start) < ticks {
            core::hint::spin_loop();
        }
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Timer",),
    async(feature = "async", keep_self)
)]
/// Simplified timer trait for delay operations.
pub trait Timer {
    /// Delay for the specified number of milliseconds.
    async fn delay_ms(&mut self, milliseconds: u16);
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl Timer for &TickCounter {
    async fn delay_ms(&mut self, milliseconds: u16) {
        self.wait_ms(milliseconds);
    }
}

/// Timer backed by the embassy time driver.
#[cfg(all(feature = "async", feature = "embassy-time"))]
pub struct EmbassyTimer;

#[cfg(all(feature = "async", feature = "embassy-time"))]
impl Timer for EmbassyTimer {
    async fn delay_ms(&mut self, milliseconds: u16) {
        embassy_time::Timer::after_millis(u64::from(milliseconds)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_advance_counts_ticks() {
        let ticks = TickCounter::new();
        assert_eq!(ticks.now(), 0);
        assert_eq!(ticks.advance(), 1);
        assert_eq!(ticks.advance(), 2);
        assert_eq!(ticks.now(), 2);
    }

    #[test]
    fn test_counter_wraps() {
        let ticks = TickCounter::starting_at(u16::MAX);
        assert_eq!(ticks.advance(), 0);
    }

    #[test]
    fn test_elapsed_across_wraparound() {
        let ticks = TickCounter::starting_at(u16::MAX - 2);
        let snapshot = ticks.now();
        for _ in 0..5 {
            ticks.advance();
        }
        assert_eq!(ticks.now(), 2);
        assert_eq!(ticks.elapsed_since(snapshot), 5);
    }

    #[test]
    fn test_wait_returns_after_duration() {
        let ticks = TickCounter::starting_at(u16::MAX - 3);
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    ticks.advance();
                    std::thread::sleep(std::time::Duration::from_micros(50));
                }
            });
            let start = ticks.now();
            ticks.wait_ms(20);
            assert!(ticks.elapsed_since(start) >= 20);
            done.store(true, Ordering::Release);
        });
    }

    #[test]
    fn test_zero_wait_returns_immediately() {
        let ticks = TickCounter::new();
        ticks.wait_ms(0);
        assert_eq!(ticks.now(), 0);
    }
}
