//! A solid block moved along one axis by two buttons.

use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};

use crate::input::Button;
use crate::scheduler::TickHandler;
use crate::ticks::Timer;
use crate::transport::Transport;
use crate::window::{Direction, Travel, Window};
use crate::{Color, Error, Panel};

/// Moves a sprite window in response to debounced button holds.
///
/// `forward` moves toward `travel.max`, `backward` toward `travel.min`.
/// A move erases the sprite with the background color, shifts the window
/// and draws it again. Moves that would leave the travel range are
/// dropped without touching the panel.
pub struct SpriteMover<F, B> {
    forward: Button<F>,
    backward: Button<B>,
    window: Window,
    travel: Travel,
    sprite: Color,
    background: Color,
    redraw_every_tick: bool,
}

impl<F, B> SpriteMover<F, B>
where
    F: InputPin<Error = Infallible>,
    B: InputPin<Error = Infallible>,
{
    pub fn new(
        window: Window,
        travel: Travel,
        sprite: Color,
        background: Color,
        forward: Button<F>,
        backward: Button<B>,
    ) -> Self {
        Self {
            forward,
            backward,
            window,
            travel,
            sprite,
            background,
            redraw_every_tick: false,
        }
    }

    /// Repaint the sprite at the start of every tick.
    pub fn with_periodic_redraw(mut self, enabled: bool) -> Self {
        self.redraw_every_tick = enabled;
        self
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn forward(&self) -> &Button<F> {
        &self.forward
    }

    pub fn backward(&self) -> &Button<B> {
        &self.backward
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "SpriteMover",),
    async(feature = "async", keep_self)
)]
impl<F, B> SpriteMover<F, B>
where
    F: InputPin<Error = Infallible>,
    B: InputPin<Error = Infallible>,
{
    /// Erase, shift and redraw the sprite. Returns whether it moved.
    pub async fn step<T, DC, RST, TIMER, E>(
        &mut self,
        panel: &mut Panel<T, DC, RST, TIMER>,
        direction: Direction,
    ) -> Result<bool, Error<E>>
    where
        T: Transport<Error = E>,
        DC: OutputPin<Error = Infallible>,
        RST: OutputPin<Error = Infallible>,
        TIMER: Timer,
    {
        if !self.window.can_shift(&self.travel, direction) {
            return Ok(false);
        }

        panel.fill_window(&self.window, self.background).await?;
        self.window.shift(&self.travel, direction);
        panel.fill_window(&self.window, self.sprite).await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("sprite moved {}: {}", direction, self.window);
        Ok(true)
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<F, B, T, DC, RST, TIMER, E> TickHandler<Panel<T, DC, RST, TIMER>> for SpriteMover<F, B>
where
    F: InputPin<Error = Infallible>,
    B: InputPin<Error = Infallible>,
    T: Transport<Error = E>,
    DC: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    TIMER: Timer,
{
    type Error = Error<E>;

    async fn on_tick(
        &mut self,
        panel: &mut Panel<T, DC, RST, TIMER>,
        _now: u16,
    ) -> Result<(), Self::Error> {
        if self.redraw_every_tick {
            panel.fill_window(&self.window, self.sprite).await?;
        }

        let forward = self.forward.sample().map_err(Error::Pin)?;
        let backward = self.backward.sample().map_err(Error::Pin)?;

        if forward {
            self.step(panel, Direction::Forward).await?;
        }
        if backward {
            self.step(panel, Direction::Backward).await?;
        }
        Ok(())
    }
}
