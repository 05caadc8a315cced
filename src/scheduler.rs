//! Periodic tick dispatch.
//!
//! The timer interrupt posts one tick per period. The scheduler owns the
//! device context and hands it to a single registered handler, so nothing
//! else can touch the panel while a tick is being serviced. At most one tick
//! is ever pending: the handler runs to completion before the next one.

use crate::ticks::TickCounter;

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "TickHandler",),
    async(feature = "async", keep_self)
)]
/// Work performed once per tick against the device context `C`.
pub trait TickHandler<C> {
    type Error;

    async fn on_tick(&mut self, context: &mut C, now: u16) -> Result<(), Self::Error>;
}

pub struct TickScheduler<'t, C, H> {
    ticks: &'t TickCounter,
    context: C,
    handler: H,
}

impl<'t, C, H> TickScheduler<'t, C, H> {
    pub fn new(ticks: &'t TickCounter, context: C, handler: H) -> Self {
        Self {
            ticks,
            context,
            handler,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn release(self) -> (C, H) {
        (self.context, self.handler)
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "TickScheduler",),
    async(feature = "async", keep_self)
)]
impl<'t, C, H> TickScheduler<'t, C, H>
where
    H: TickHandler<C>,
{
    /// Count one period and run the handler once.
    pub async fn service_tick(&mut self) -> Result<u16, H::Error> {
        let now = self.ticks.advance();
        self.handler.on_tick(&mut self.context, now).await?;
        Ok(now)
    }
}

#[cfg(all(feature = "async", feature = "embassy-time"))]
impl<'t, C, H> TickScheduler<'t, C, H>
where
    H: TickHandler<C>,
{
    /// Service one tick per period until the handler fails.
    pub async fn run(&mut self) -> H::Error {
        let period = embassy_time::Duration::from_millis(u64::from(crate::ticks::TICK_PERIOD_MS));
        let mut ticker = embassy_time::Ticker::every(period);
        loop {
            ticker.next().await;
            if let Err(err) = self.service_tick().await {
                return err;
            }
        }
    }
}
