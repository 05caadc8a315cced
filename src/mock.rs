//! Recording doubles for pins, SPI and delays, sharing one event log.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{self, ErrorKind, ErrorType as SpiErrorType, Operation};

#[cfg(not(feature = "async"))]
use embedded_hal::spi::SpiDevice;
#[cfg(feature = "async")]
use embedded_hal_async::spi::SpiDevice;

use crate::ticks::Timer;
use crate::transport::SpiTransport;
use crate::{Config, Panel};

#[cfg(feature = "async")]
pub use embassy_futures::block_on;

/// Blocking calls have already completed; pass their result through.
#[cfg(not(feature = "async"))]
pub fn block_on<T>(result: T) -> T {
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Pin(&'static str, bool),
    Byte(u8),
    Delay(u16),
}

#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn delays(&self) -> Vec<u16> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Delay(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }

    /// Words sent while the mode line was high.
    pub fn command_words(&self) -> Vec<u16> {
        self.words(true)
    }

    /// Words sent while the mode line was low (the level after reset).
    pub fn data_words(&self) -> Vec<u16> {
        self.words(false)
    }

    fn words(&self, command: bool) -> Vec<u16> {
        let mut dc_high = false;
        let bytes: Vec<u8> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pin("dc", level) => {
                    dc_high = level;
                    None
                }
                Event::Byte(b) if dc_high == command => Some(b),
                _ => None,
            })
            .collect();
        assert!(bytes.len() % 2 == 0, "odd byte count in word stream");
        bytes
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Output pin that records its level changes.
pub struct MockPin {
    log: Log,
    name: &'static str,
}

impl MockPin {
    pub fn new(log: &Log, name: &'static str) -> Self {
        Self {
            log: log.clone(),
            name,
        }
    }
}

impl PinErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.push(Event::Pin(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.push(Event::Pin(self.name, true));
        Ok(())
    }
}

/// Input pin whose level is set by the test; clones share the level.
#[derive(Clone)]
pub struct MockInput(Rc<Cell<bool>>);

impl MockInput {
    pub fn new(high: bool) -> Self {
        Self(Rc::new(Cell::new(high)))
    }

    pub fn set_high(&self, high: bool) {
        self.0.set(high);
    }
}

impl PinErrorType for MockInput {
    type Error = Infallible;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSpiError;

impl spi::Error for MockSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// SPI device logging every written byte.
pub struct MockSpi {
    log: Log,
    fail: bool,
    transactions: usize,
}

impl MockSpi {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail: false,
            transactions: 0,
        }
    }

    pub fn failing(log: &Log) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    pub fn transactions(&self) -> usize {
        self.transactions
    }
}

impl SpiErrorType for MockSpi {
    type Error = MockSpiError;
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl SpiDevice for MockSpi {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), MockSpiError> {
        if self.fail {
            return Err(MockSpiError);
        }
        self.transactions += 1;
        for op in operations {
            if let Operation::Write(bytes) = op {
                for &b in bytes.iter() {
                    self.log.push(Event::Byte(b));
                }
            }
        }
        Ok(())
    }
}

/// Timer that records requested delays instead of waiting.
pub struct MockTimer {
    log: Log,
}

impl MockTimer {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl Timer for MockTimer {
    async fn delay_ms(&mut self, milliseconds: u16) {
        self.log.push(Event::Delay(milliseconds));
    }
}

pub type TestPanel = Panel<SpiTransport<MockSpi>, MockPin, MockPin, MockTimer>;

pub fn test_panel(config: Config) -> (Log, TestPanel) {
    let log = Log::new();
    let panel = Panel::new(
        config,
        SpiTransport::new(MockSpi::new(&log)),
        MockPin::new(&log, "dc"),
        MockPin::new(&log, "rst"),
        MockTimer::new(&log),
    );
    (log, panel)
}
