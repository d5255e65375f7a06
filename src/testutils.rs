//! Host-side models of the controller, its clock and the DMA engine

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use fugit::HertzU32 as Hertz;

use crate::clock::ClockControl;
use crate::delay::Relax;
use crate::dma::{
    on_complete, Channel, ChannelRequest, DmaAddr, DmaController, DmaError, DmaStatus, DmaTransfer, Direction,
};
use crate::interrupt::InterruptHandler;
use crate::regs::*;
use crate::state::State;

const PHYS_BASE: usize = 0x01c4_1000;
const FLG_RX_INTR: u32 = 1 << 8;

#[derive(Default)]
struct Window {
    regs: [u32; 32],
    /// Word held in SPIBUF
    buf: Option<u16>,
    /// Words received while SPIBUF was full
    pending: VecDeque<u16>,
    /// Words the peripheral answers with outside loopback
    miso: VecDeque<u16>,
    /// Fault bits of SPIFLG
    faults: u32,
    tx_full: bool,
    dat1_writes: Vec<u32>,
    shifted: Vec<u16>,
}

impl Window {
    fn receive(&mut self, word: u16) {
        if self.buf.is_none() {
            self.buf = Some(word);
        } else {
            self.pending.push_back(word);
        }
    }
}

/// Register file of one controller.
///
/// A word written to SPIDAT1 is shifted out while GCR1.SPIENA is set; the
/// received word is the same word in loopback, otherwise the next scripted
/// MISO word (0 when none is left).
#[derive(Default)]
pub struct MockSpi {
    inner: RefCell<Window>,
}

impl MockSpi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock one word out and receive one.
    pub fn shift(&self, word: u16) {
        let mut w = self.inner.borrow_mut();
        w.shifted.push(word);
        let rx = if w.regs[Reg::Gcr1.offset() / 4] & GCR1_LOOPBACK != 0 {
            word
        } else {
            w.miso.pop_front().unwrap_or(0)
        };
        w.receive(rx);
    }

    /// A word arrives without being clocked by this driver.
    pub fn push_rx(&self, word: u16) {
        self.inner.borrow_mut().receive(word);
    }

    pub fn push_miso(&self, words: &[u16]) {
        self.inner.borrow_mut().miso.extend(words.iter().copied());
    }

    pub fn set_flags(&self, faults: u32) {
        self.inner.borrow_mut().faults = faults;
    }

    pub fn set_tx_full(&self, full: bool) {
        self.inner.borrow_mut().tx_full = full;
    }

    pub fn dat1_writes(&self) -> Vec<u32> {
        self.inner.borrow().dat1_writes.clone()
    }

    /// Words clocked out on MOSI
    pub fn shifted(&self) -> Vec<u16> {
        self.inner.borrow().shifted.clone()
    }

    /// Plain register contents
    pub fn snapshot(&self) -> [u32; 32] {
        self.inner.borrow().regs
    }
}

impl Regs for MockSpi {
    fn read(&self, reg: Reg) -> u32 {
        let mut w = self.inner.borrow_mut();
        match reg {
            Reg::Buf => {
                let tx_full = if w.tx_full { BUF_TXFULL } else { 0 };
                match w.buf.take() {
                    Some(word) => {
                        w.buf = w.pending.pop_front();
                        word as u32 | tx_full
                    }
                    None => BUF_RXEMPTY | tx_full,
                }
            }
            Reg::Flg => w.faults | if w.buf.is_some() { FLG_RX_INTR } else { 0 },
            reg => w.regs[reg.offset() / 4],
        }
    }

    fn write(&self, reg: Reg, val: u32) {
        let shift = {
            let mut w = self.inner.borrow_mut();
            match reg {
                Reg::Dat1 => {
                    w.dat1_writes.push(val);
                    w.regs[reg.offset() / 4] = val;
                    w.regs[Reg::Gcr1.offset() / 4] & GCR1_SPIENA != 0
                }
                Reg::Flg => {
                    w.faults &= !val;
                    false
                }
                reg => {
                    w.regs[reg.offset() / 4] = val;
                    false
                }
            }
        };
        if shift {
            self.shift(val as u16);
        }
    }

    fn bus_addr(&self, reg: Reg) -> usize {
        PHYS_BASE + reg.offset()
    }
}

/// Input clock with an adjustable rate.
pub struct MockClock {
    rate: Cell<u32>,
    enabled: Cell<bool>,
}

impl MockClock {
    pub fn new(rate: u32) -> Self {
        Self {
            rate: Cell::new(rate),
            enabled: Cell::new(false),
        }
    }

    pub fn set_rate(&self, rate: u32) {
        self.rate.set(rate);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl ClockControl for &MockClock {
    fn rate(&self) -> Hertz {
        Hertz::from_raw(self.rate.get())
    }

    fn enable(&mut self) {
        self.enabled.set(true);
    }

    fn disable(&mut self) {
        self.enabled.set(false);
    }
}

/// Delay provider that only counts.
#[derive(Default)]
pub struct MockDelay {
    ns: u64,
}

impl MockDelay {
    pub fn total_ns(&self) -> u64 {
        self.ns
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ns += ns as u64;
    }
}

/// Relax step that runs the interrupt handler whenever INT.RX is enabled,
/// as if the interrupt preempted the spin loop.
pub struct IrqRelax<'a> {
    hw: &'a MockSpi,
    state: &'a State,
}

impl<'a> IrqRelax<'a> {
    pub fn new(hw: &'a MockSpi, state: &'a State) -> Self {
        Self { hw, state }
    }
}

impl Relax for IrqRelax<'_> {
    fn relax(&mut self) {
        if self.hw.read(Reg::Int) & INT_RX != 0 {
            InterruptHandler::new(self.hw, self.state).on_interrupt();
        }
    }
}

#[derive(Default)]
struct Engine {
    next: u32,
    live: Vec<(Channel, ChannelRequest)>,
    requests: Vec<ChannelRequest>,
    freed: Vec<Channel>,
    programs: Vec<(Channel, DmaTransfer)>,
    started: Vec<Channel>,
    stopped: Vec<Channel>,
    cleaned: Vec<Channel>,
    mapped: Vec<(DmaAddr, usize, Direction)>,
    unmapped: Vec<(DmaAddr, usize, Direction)>,
    fail_alloc: Option<Direction>,
    fail_map_rx: bool,
    fault: Option<(Direction, u16)>,
    interrupt_on_start: bool,
}

/// DMA engine that runs a channel to completion as soon as it is started
/// and reports through [`on_complete`].
pub struct MockDma<'a> {
    hw: &'a MockSpi,
    state: &'a State,
    inner: RefCell<Engine>,
}

impl<'a> MockDma<'a> {
    pub fn new(hw: &'a MockSpi, state: &'a State) -> Self {
        Self {
            hw,
            state,
            inner: RefCell::new(Engine::default()),
        }
    }

    pub fn fail_alloc(&self, direction: Direction) {
        self.inner.borrow_mut().fail_alloc = Some(direction);
    }

    pub fn fail_map_rx(&self) {
        self.inner.borrow_mut().fail_map_rx = true;
    }

    /// Complete every started channel of `direction` with an error.
    pub fn fault(&self, direction: Direction, code: u16) {
        self.inner.borrow_mut().fault = Some((direction, code));
    }

    /// Cancel the waiting engine instead of completing started channels.
    pub fn interrupt_on_start(&self) {
        self.inner.borrow_mut().interrupt_on_start = true;
    }

    /// Channels currently allocated
    pub fn allocated(&self) -> usize {
        self.inner.borrow().live.len()
    }

    pub fn requests(&self) -> Vec<ChannelRequest> {
        self.inner.borrow().requests.clone()
    }

    pub fn freed(&self) -> Vec<Channel> {
        self.inner.borrow().freed.clone()
    }

    pub fn program(&self, ch: Channel) -> Option<DmaTransfer> {
        self.inner
            .borrow()
            .programs
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, xfer)| *xfer)
    }

    pub fn started(&self) -> Vec<Channel> {
        self.inner.borrow().started.clone()
    }

    pub fn stopped(&self) -> Vec<Channel> {
        self.inner.borrow().stopped.clone()
    }

    pub fn cleaned(&self) -> Vec<Channel> {
        self.inner.borrow().cleaned.clone()
    }

    pub fn mapped(&self) -> Vec<(DmaAddr, usize, Direction)> {
        self.inner.borrow().mapped.clone()
    }

    pub fn unmapped(&self) -> Vec<(DmaAddr, usize, Direction)> {
        self.inner.borrow().unmapped.clone()
    }

    fn run(&self, direction: Direction, xfer: &DmaTransfer) {
        let width = xfer.width.bytes();
        for i in 0..xfer.count {
            match direction {
                Direction::Tx => {
                    let src = (xfer.src + i * xfer.src_step as usize) as *const u8;
                    let mut bytes = [0u8; 2];
                    // SAFETY: `src` lies in a buffer mapped by the engine under test
                    unsafe { core::ptr::copy_nonoverlapping(src, bytes.as_mut_ptr(), width.min(2)) };
                    let word = if width == 1 {
                        bytes[0] as u16
                    } else {
                        u16::from_ne_bytes(bytes)
                    };
                    self.hw.shift(word);
                }
                Direction::Rx => {
                    let word = self.hw.read(Reg::Buf) as u16;
                    let bytes = if width == 1 {
                        [word as u8, 0]
                    } else {
                        word.to_ne_bytes()
                    };
                    let dst = (xfer.dst + i * xfer.dst_step as usize) as *mut u8;
                    // SAFETY: `dst` lies in a buffer mapped by the engine under test
                    unsafe { core::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, width.min(2)) };
                }
            }
        }
    }
}

impl DmaController for MockDma<'_> {
    fn alloc_channel(&self, req: ChannelRequest) -> Result<Channel, DmaError> {
        let mut e = self.inner.borrow_mut();
        e.requests.push(req);
        if e.fail_alloc == Some(req.direction) {
            return Err(DmaError::NoChannel);
        }
        let ch = Channel(e.next);
        e.next += 1;
        e.live.push((ch, req));
        Ok(ch)
    }

    fn free_channel(&self, ch: Channel) {
        let mut e = self.inner.borrow_mut();
        e.live.retain(|(c, _)| *c != ch);
        e.freed.push(ch);
    }

    fn configure(&self, ch: Channel, xfer: &DmaTransfer) {
        let mut e = self.inner.borrow_mut();
        e.programs.retain(|(c, _)| *c != ch);
        e.programs.push((ch, *xfer));
    }

    fn start(&self, ch: Channel) {
        let (req, xfer, fault, interrupt) = {
            let mut e = self.inner.borrow_mut();
            e.started.push(ch);
            let req = e.live.iter().find(|(c, _)| *c == ch).map(|(_, r)| *r);
            let xfer = e.programs.iter().find(|(c, _)| *c == ch).map(|(_, x)| *x);
            (req, xfer, e.fault, e.interrupt_on_start)
        };
        let (Some(req), Some(xfer)) = (req, xfer) else {
            panic!("channel {:?} started without allocation or program", ch);
        };

        if interrupt {
            self.state.interrupt_wait();
            return;
        }

        let status = match fault {
            Some((direction, code)) if direction == req.direction => DmaStatus::Error(code),
            _ => {
                self.run(req.direction, &xfer);
                DmaStatus::Complete
            }
        };
        on_complete(self.hw, self, self.state, req.cs, req.direction, ch, status);
    }

    fn stop(&self, ch: Channel) {
        self.inner.borrow_mut().stopped.push(ch);
    }

    fn clean(&self, ch: Channel) {
        self.inner.borrow_mut().cleaned.push(ch);
    }

    fn map_to_device(&self, buf: &[u8]) -> Result<DmaAddr, DmaError> {
        let addr = buf.as_ptr() as DmaAddr;
        self.inner.borrow_mut().mapped.push((addr, buf.len(), Direction::Tx));
        Ok(addr)
    }

    fn map_from_device(&self, buf: &mut [u8]) -> Result<DmaAddr, DmaError> {
        let mut e = self.inner.borrow_mut();
        if e.fail_map_rx {
            return Err(DmaError::Mapping);
        }
        let addr = buf.as_mut_ptr() as DmaAddr;
        e.mapped.push((addr, buf.len(), Direction::Rx));
        Ok(addr)
    }

    fn unmap(&self, addr: DmaAddr, len: usize, direction: Direction) {
        self.inner.borrow_mut().unmapped.push((addr, len, direction));
    }
}
