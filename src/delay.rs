//! Busy-wait support
//!
//! Every spin loop of the driver calls [`Relax::relax`] between two polls of a
//! hardware flag.

use embedded_hal::delay::DelayNs;

/// The step taken between two polls of a hardware flag.
pub trait Relax {
    fn relax(&mut self);
}

/// Spin-loop hint, the default.
#[derive(Clone, Copy, Default, Debug)]
pub struct SpinRelax;

impl Relax for SpinRelax {
    #[inline]
    fn relax(&mut self) {
        core::hint::spin_loop();
    }
}

/// Sleep a fixed interval between polls using a [`DelayNs`] provider.
pub struct DelayRelax<D> {
    delay: D,
    interval_ns: u32,
}

impl<D: DelayNs> DelayRelax<D> {
    pub fn new(delay: D, interval_ns: u32) -> Self {
        Self { delay, interval_ns }
    }
}

impl<D: DelayNs> Relax for DelayRelax<D> {
    #[inline]
    fn relax(&mut self) {
        self.delay.delay_ns(self.interval_ns);
    }
}

/// A poll loop exceeded its bound.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Stalled;

/// Spin until `ready` returns true.
///
/// With `limit` set, give up after that many unsuccessful polls.
pub(crate) fn spin_until<W: Relax>(
    relax: &mut W,
    limit: Option<u32>,
    mut ready: impl FnMut() -> bool,
) -> Result<(), Stalled> {
    let mut polls: u32 = 0;
    while !ready() {
        if let Some(limit) = limit {
            if polls >= limit {
                return Err(Stalled);
            }
        }
        polls = polls.wrapping_add(1);
        relax.relax();
    }
    Ok(())
}
