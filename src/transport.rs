//! Byte transports between the driver and the panel.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
#[cfg(not(feature = "async"))]
use embedded_hal::spi::SpiDevice;
#[cfg(feature = "async")]
use embedded_hal_async::spi::SpiDevice;

use crate::Error;

/// Default number of completion polls before a transfer counts as hung.
pub const DEFAULT_SPIN_LIMIT: u32 = 10_000;

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Transport",),
    async(feature = "async", keep_self)
)]
/// Serial link to the panel.
///
/// Every byte is its own framed transfer: chip-select is asserted, the byte
/// is shifted out and chip-select is released before the call returns.
pub trait Transport {
    /// Bus error type of the underlying peripheral.
    type Error;

    /// Send one byte, blocking until the shift has completed.
    async fn write_byte(&mut self, byte: u8) -> Result<(), Error<Self::Error>>;

    /// Drive chip-select to its inactive level.
    fn idle(&mut self) -> Result<(), Error<Self::Error>>;
}

/// Transport over an `embedded-hal` SPI device.
///
/// The device owns chip-select and toggles it around each transaction.
pub struct SpiTransport<SPI> {
    spi: SPI,
}

impl<SPI> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<SPI> Transport for SpiTransport<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    async fn write_byte(&mut self, byte: u8) -> Result<(), Error<Self::Error>> {
        self.spi.write(&[byte]).await.map_err(Error::Comm)
    }

    fn idle(&mut self) -> Result<(), Error<Self::Error>> {
        // Chip-select is released by the device after every transaction.
        Ok(())
    }
}

/// Raw shift register of a serial peripheral with a completion flag.
pub trait ShiftRegister {
    /// Load `byte` and start shifting it out.
    fn start(&mut self, byte: u8);

    /// Whether the last started shift has completed.
    fn is_complete(&mut self) -> bool;
}

/// Transport driving a bare shift register and its chip-select line.
///
/// Completion is polled at most `spin_limit` times; a peripheral that never
/// reports completion is surfaced as [`Error::HardwareFault`].
pub struct PolledTransport<S, CS> {
    shift: S,
    cs: CS,
    spin_limit: u32,
}

impl<S, CS> PolledTransport<S, CS>
where
    S: ShiftRegister,
    CS: OutputPin<Error = Infallible>,
{
    pub fn new(shift: S, cs: CS) -> Self {
        Self::with_spin_limit(shift, cs, DEFAULT_SPIN_LIMIT)
    }

    pub fn with_spin_limit(shift: S, cs: CS, spin_limit: u32) -> Self {
        Self {
            shift,
            cs,
            spin_limit: spin_limit.max(1),
        }
    }

    pub fn release(self) -> (S, CS) {
        (self.shift, self.cs)
    }

    fn shift_out(&mut self, byte: u8) -> Result<(), Error<Infallible>> {
        self.cs.set_low().map_err(Error::Pin)?;
        self.shift.start(byte);

        let mut polls = 0;
        while !self.shift.is_complete() {
            polls += 1;
            if polls >= self.spin_limit {
                self.cs.set_high().map_err(Error::Pin)?;
                #[cfg(feature = "defmt")]
                defmt::error!("serial transfer of {=u8:#x} never completed", byte);
                return Err(Error::HardwareFault);
            }
            core::hint::spin_loop();
        }

        self.cs.set_high().map_err(Error::Pin)
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<S, CS> Transport for PolledTransport<S, CS>
where
    S: ShiftRegister,
    CS: OutputPin<Error = Infallible>,
{
    type Error = Infallible;

    async fn write_byte(&mut self, byte: u8) -> Result<(), Error<Self::Error>> {
        self.shift_out(byte)
    }

    fn idle(&mut self) -> Result<(), Error<Self::Error>> {
        self.cs.set_high().map_err(Error::Pin)
    }
}
