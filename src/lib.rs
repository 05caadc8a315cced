#![cfg_attr(not(test), no_std)]

use core::convert::Infallible;

use embedded_graphics_core::pixelcolor::{Rgb565, raw::RawU16};
use embedded_graphics_core::prelude::RawData;
use embedded_hal::digital::OutputPin;

pub mod input;
pub mod rle;
pub mod scheduler;
pub mod sprite;
pub mod ticks;
pub mod transport;
pub mod window;

#[cfg(test)]
mod mock;

pub use input::{Button, ButtonState, DebounceState};
pub use rle::{DecodeError, RunLengthDecoder};
pub use scheduler::{TickHandler, TickScheduler};
pub use sprite::SpriteMover;
pub use ticks::{TickCounter, Timer};
pub use transport::{PolledTransport, ShiftRegister, SpiTransport, Transport};
pub use window::{
    Axis, Direction, IMAGE_WINDOW, Orientation, PANEL_HEIGHT, PANEL_WIDTH, SPRITE_WINDOW, Travel,
    Window,
};

#[cfg(all(feature = "async", feature = "embassy-time"))]
pub use ticks::EmbassyTimer;

/// Pixel value in the panel's native 5-6-5 encoding.
pub type Color = Rgb565;

pub const YELLOW: Color = Rgb565::new(31, 63, 0);
pub const GREEN: Color = Rgb565::new(0, 63, 0);
pub const RED: Color = Rgb565::new(31, 0, 0);

/// One vendor initialization block and the delay that precedes it.
#[derive(Debug, Clone, Copy)]
pub struct InitStep<'a> {
    pub delay_ms: u16,
    pub commands: &'a [u16],
}

impl<'a> InitStep<'a> {
    pub const fn new(delay_ms: u16, commands: &'a [u16]) -> Self {
        Self { delay_ms, commands }
    }
}

const WAKE_BLOCK: &[u16] = &[0xFDFD, 0xFDFD];

const POWER_BLOCK: &[u16] = &[
    0xEF00, 0xEE04, 0x1B04, 0xFEFE, 0xFEFE, 0xEF90, 0x4A04, 0x7F3F, 0xEE04, 0x4306,
];

const DISPLAY_BLOCK: &[u16] = &[
    0xEF90, 0x0983, 0x0800, 0x0BAF, 0x0A00, 0x0500, 0x0600, 0x0700, 0xEF00, 0xEE0C, 0xEF90, 0x0080,
    0xEFB0, 0x4902, 0xEF00, 0x7F01, 0xE181, 0xE202, 0xE276, 0xE183, 0x8001, 0xEF90, 0x0000,
];

/// Full screen, 132 x 176.
const PORTRAIT_ADDRESSING: &[u16] = &[0xEF08, 0x1800, 0x1200, 0x1583, 0x1300, 0x16AF];

/// Full screen, 176 x 132, columns scanned in reverse.
const LANDSCAPE_ADDRESSING: &[u16] = &[0xEF08, 0x1805, 0x1283, 0x1500, 0x1300, 0x16AF];

/// Vendor initialization for 16-bit color mode in portrait, replayed verbatim.
pub const PORTRAIT_INIT_SEQUENCE: &[InitStep<'static>] = &[
    InitStep::new(75, WAKE_BLOCK),
    InitStep::new(75, POWER_BLOCK),
    InitStep::new(75, DISPLAY_BLOCK),
    InitStep::new(75, PORTRAIT_ADDRESSING),
];

/// Vendor initialization for 16-bit color mode in landscape, replayed verbatim.
pub const LANDSCAPE_INIT_SEQUENCE: &[InitStep<'static>] = &[
    InitStep::new(75, WAKE_BLOCK),
    InitStep::new(75, POWER_BLOCK),
    InitStep::new(75, DISPLAY_BLOCK),
    InitStep::new(75, LANDSCAPE_ADDRESSING),
];

pub const DEFAULT_INIT_SEQUENCE: &[InitStep<'static>] = PORTRAIT_INIT_SEQUENCE;

/// Vendor sequence ending with the full-screen window for `orientation`.
pub const fn init_sequence(orientation: Orientation) -> &'static [InitStep<'static>] {
    match orientation {
        Orientation::Portrait => PORTRAIT_INIT_SEQUENCE,
        Orientation::Landscape => LANDSCAPE_INIT_SEQUENCE,
    }
}

/// Delays of the hardware reset choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetTiming {
    /// Wait after power-up before touching the reset line.
    pub power_up_ms: u16,
    /// Wait after each reset phase; reset is held low for three phases.
    pub phase_ms: u16,
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self {
            power_up_ms: 300,
            phase_ms: 75,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Config {
    pub orientation: Orientation,
    pub width: u16,
    pub height: u16,
    pub reset: ResetTiming,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            reset: ResetTiming::default(),
        }
    }
}

#[derive(Debug)]
pub enum Error<E = ()> {
    /// Communication error
    Comm(E),
    /// Pin setting error
    Pin(Infallible),
    /// A serial transfer never signalled completion
    HardwareFault,
    /// Run-length stream rejected before drawing
    Decode(DecodeError),
}

impl<E> From<DecodeError> for Error<E> {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

/// Phase selected by the mode line while a word is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Each word is framed by its own command-phase toggle.
    Command,
    /// Words are streamed in the data phase.
    Data,
}

/// What to stream into a scene's window.
#[derive(Debug, Clone, Copy)]
pub enum FillSpec<'a> {
    Solid(Color),
    /// Run-length coded raw pixels, see [`rle`].
    Encoded(&'a [u16]),
}

/// Orientation and everything the startup routine draws after
/// initialization.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub orientation: Orientation,
    pub background: Color,
    pub window: Window,
    pub fill: FillSpec<'a>,
}

impl Scene<'static> {
    /// Yellow background with the green block that buttons move around.
    pub const fn moving_block() -> Self {
        Self {
            orientation: Orientation::Portrait,
            background: YELLOW,
            window: SPRITE_WINDOW,
            fill: FillSpec::Solid(GREEN),
        }
    }
}

impl<'a> Scene<'a> {
    /// Green background with a run-length coded landscape image.
    pub const fn image(stream: &'a [u16]) -> Self {
        Self {
            orientation: Orientation::Landscape,
            background: GREEN,
            window: IMAGE_WINDOW,
            fill: FillSpec::Encoded(stream),
        }
    }
}

/// Driver for the SPI-attached TFT panel.
pub struct Panel<T, DC, RST, TIMER>
where
    T: Transport,
    DC: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    TIMER: Timer,
{
    transport: T,
    dc: DC,
    rst: RST,
    timer: TIMER,
    config: Config,
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Panel",),
    async(feature = "async", keep_self)
)]
impl<T, DC, RST, E, TIMER> Panel<T, DC, RST, TIMER>
where
    T: Transport<Error = E>,
    DC: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    TIMER: Timer,
{
    pub fn new(config: Config, transport: T, dc: DC, rst: RST, timer: TIMER) -> Self {
        Self {
            transport,
            dc,
            rst,
            timer,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Window covering the whole screen in the configured orientation.
    pub fn full_screen(&self) -> Window {
        Window::full_screen(
            self.config.orientation,
            self.config.width,
            self.config.height,
        )
    }

    /// Hardware reset, then replay `steps` verbatim.
    ///
    /// The last vendor block selects the addressing mode and the full-screen
    /// window, so `steps` should match the configured orientation, see
    /// [`init_sequence`].
    pub async fn init(&mut self, steps: &[InitStep<'_>]) -> Result<(), Error<E>> {
        self.reset().await?;

        for step in steps {
            self.timer.delay_ms(step.delay_ms).await;
            self.send_command_sequence(step.commands).await?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("panel initialized: {}", self.config.orientation);
        Ok(())
    }

    pub async fn reset(&mut self) -> Result<(), Error<E>> {
        let timing = self.config.reset;
        self.timer.delay_ms(timing.power_up_ms).await;
        self.rst.set_low().map_err(Error::Pin)?;
        self.timer.delay_ms(timing.phase_ms).await;
        self.transport.idle()?;
        self.timer.delay_ms(timing.phase_ms).await;
        self.dc.set_high().map_err(Error::Pin)?;
        self.timer.delay_ms(timing.phase_ms).await;
        self.rst.set_high().map_err(Error::Pin)?;

        Ok(())
    }

    pub async fn set_orientation(&mut self, orientation: Orientation) -> Result<(), Error<E>> {
        self.config.orientation = orientation;
        let screen = self.full_screen();
        self.set_window(&screen).await
    }

    /// Write one 16-bit word, most significant byte first.
    pub async fn write_word(&mut self, word: u16) -> Result<(), Error<E>> {
        let [high, low] = word.to_be_bytes();
        self.transport.write_byte(high).await?;
        self.transport.write_byte(low).await
    }

    /// Send `items` in the given phase.
    ///
    /// In command phase the mode line is raised before and lowered after
    /// every single word. This panel treats a high mode line as command.
    pub async fn send_sequence(&mut self, items: &[u16], mode: Mode) -> Result<(), Error<E>> {
        for &item in items {
            if mode == Mode::Command {
                self.dc.set_high().map_err(Error::Pin)?;
            }
            self.write_word(item).await?;
            if mode == Mode::Command {
                self.dc.set_low().map_err(Error::Pin)?;
            }
        }
        Ok(())
    }

    pub async fn send_command_sequence(&mut self, items: &[u16]) -> Result<(), Error<E>> {
        self.send_sequence(items, Mode::Command).await
    }

    /// Address `window`; the panel then auto-increments through it.
    pub async fn set_window(&mut self, window: &Window) -> Result<(), Error<E>> {
        self.send_command_sequence(&window.to_words()).await
    }

    /// Stream `color` exactly `count` times as pixel data.
    ///
    /// Must follow addressing a window of exactly `count` pixels, otherwise
    /// the panel's write cursor is left out of step until the next window.
    pub async fn fill_solid(&mut self, count: u32, color: Color) -> Result<(), Error<E>> {
        let raw = RawU16::from(color).into_inner();
        for _ in 0..count {
            self.write_word(raw).await?;
        }
        Ok(())
    }

    /// Stream every color `pixels` yields as pixel data.
    pub async fn fill_from_decoder<I>(&mut self, pixels: I) -> Result<(), Error<E>>
    where
        I: IntoIterator<Item = Color>,
    {
        for color in pixels {
            self.write_word(RawU16::from(color).into_inner()).await?;
        }
        Ok(())
    }

    /// Address `window` and fill it with `color`.
    pub async fn fill_window(&mut self, window: &Window, color: Color) -> Result<(), Error<E>> {
        self.set_window(window).await?;
        self.fill_solid(window.area(), color).await
    }

    /// Fill entire screen with a single color
    pub async fn fill_screen(&mut self, color: Color) -> Result<(), Error<E>> {
        let screen = self.full_screen();
        self.fill_window(&screen, color).await
    }

    /// Initialize the panel in the scene's orientation and draw it once.
    ///
    /// An encoded fill is validated before the panel is touched.
    pub async fn bring_up(&mut self, scene: &Scene<'_>) -> Result<(), Error<E>> {
        let pixels = match scene.fill {
            FillSpec::Solid(color) => Pixels::Solid(color),
            FillSpec::Encoded(stream) => Pixels::Decoded(RunLengthDecoder::new(stream)?),
        };

        self.config.orientation = scene.orientation;
        self.init(init_sequence(scene.orientation)).await?;
        self.fill_screen(scene.background).await?;
        self.set_window(&scene.window).await?;

        match pixels {
            Pixels::Solid(color) => self.fill_solid(scene.window.area(), color).await,
            Pixels::Decoded(decoder) => {
                #[cfg(feature = "defmt")]
                {
                    if decoder.pixel_count() != scene.window.area() {
                        defmt::warn!(
                            "image has {} pixels, window holds {}",
                            decoder.pixel_count(),
                            scene.window.area()
                        );
                    }
                }
                self.fill_from_decoder(decoder).await
            }
        }
    }
}

/// A scene fill, validated and ready to stream.
enum Pixels<'a> {
    Solid(Color),
    Decoded(RunLengthDecoder<'a>),
}
