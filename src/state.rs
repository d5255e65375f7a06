//! State shared between the transfer engine and asynchronous contexts
//!
//! The interrupt handler, DMA completion callbacks, and the frequency-change and
//! power hooks only talk to a transfer in flight through this struct.

use core::cell::RefCell;
use core::future::poll_fn;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Poll;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::{Duration, Instant};

use crate::dma::DmaStatus;
use crate::spi::MAX_CHIPSELECT;

/// Words the interrupt handler may post before the engine collects them
pub const RX_MAILBOX_DEPTH: usize = 4;

/// Tasks that can wait for the end of a transfer at the same time
const IDLE_WAITERS: usize = 4;

pub(crate) struct DmaSignals {
    pub rx: Signal<CriticalSectionRawMutex, DmaStatus>,
    pub tx: Signal<CriticalSectionRawMutex, DmaStatus>,
}

impl DmaSignals {
    const fn new() -> Self {
        Self {
            rx: Signal::new(),
            tx: Signal::new(),
        }
    }

    fn reset(&self) {
        self.rx.reset();
        self.tx.reset();
    }
}

const NEW_DMA_SIGNALS: DmaSignals = DmaSignals::new();

/// Coordination state of one controller.
pub struct State {
    in_use: AtomicBool,
    idle_waiters: Mutex<CriticalSectionRawMutex, RefCell<MultiWakerRegistration<IDLE_WAITERS>>>,
    interrupt: Signal<CriticalSectionRawMutex, ()>,
    pub(crate) rx_mailbox: Channel<CriticalSectionRawMutex, u16, RX_MAILBOX_DEPTH>,
    pub(crate) dma: [DmaSignals; MAX_CHIPSELECT],
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub const fn new() -> Self {
        Self {
            in_use: AtomicBool::new(false),
            idle_waiters: Mutex::new(RefCell::new(MultiWakerRegistration::new())),
            interrupt: Signal::new(),
            rx_mailbox: Channel::new(),
            dma: [NEW_DMA_SIGNALS; MAX_CHIPSELECT],
        }
    }

    /// Is a transfer in flight?
    #[inline]
    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Mark a transfer as started. Dropping the guard marks it finished and
    /// releases every waiter.
    pub(crate) fn begin(&self) -> InUse<'_> {
        self.interrupt.reset();
        while self.rx_mailbox.try_receive().is_ok() {}
        self.in_use.store(true, Ordering::Release);
        InUse { state: self }
    }

    pub(crate) fn reset_dma(&self, cs: u8) {
        self.dma[cs as usize].reset();
    }

    /// Wait until no transfer is in flight.
    ///
    /// Any number of tasks may wait at once; all of them are released when
    /// the transfer ends.
    pub async fn wait_idle(&self) {
        poll_fn(|cx| {
            if !self.in_use() {
                return Poll::Ready(());
            }
            self.idle_waiters.lock(|w| {
                let _ = w.borrow_mut().register(cx.waker());
            });
            // the transfer may have ended before the waker was registered
            if self.in_use() {
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
        .await
    }

    pub fn blocking_wait_idle(&self) {
        block_on(self.wait_idle())
    }

    /// Non-blocking check for the end of a transfer.
    pub fn poll_idle(&self) -> nb::Result<(), core::convert::Infallible> {
        if !self.in_use() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Wait until no transfer is in flight, for at most `timeout`.
    ///
    /// Returns `false` on timeout.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.poll_idle() {
                Ok(()) => return true,
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => match e {},
            }
            if Instant::now() >= deadline {
                return false;
            }
            core::hint::spin_loop();
        }
    }

    /// Unblock a DMA transfer waiting for completion.
    ///
    /// The DMA channels are not stopped; the transfer in flight fails with
    /// [`Error::Interrupted`](crate::spi::Error::Interrupted).
    pub fn interrupt_wait(&self) {
        self.interrupt.signal(());
    }

    pub(crate) async fn interrupted(&self) {
        self.interrupt.wait().await
    }
}

/// Marks a transfer in flight.
pub(crate) struct InUse<'a> {
    state: &'a State,
}

impl Drop for InUse<'_> {
    fn drop(&mut self) {
        self.state.in_use.store(false, Ordering::Release);
        self.state.idle_waiters.lock(|w| w.borrow_mut().wake());
    }
}
