//! DMA controller interface
//!
//! The transfer engine programs two channels per chip-select: memory to SPIDAT1
//! for transmit and SPIBUF to memory for receive. Channel completion is
//! reported by the platform's DMA interrupt through [`on_complete`].

use crate::regs::{Regs, INT_DMA_REQ_EN};
use crate::state::State;

/// Bus address of a mapped buffer or register
pub type DmaAddr = usize;

/// Platform channel number
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(pub u32);

/// Receive and transmit channels of one chip-select.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelPair {
    pub rx: Channel,
    pub tx: Channel,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// SPIBUF to memory
    Rx,
    /// Memory to SPIDAT1
    Tx,
}

/// Final status of a channel, as reported by the DMA interrupt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaStatus {
    Complete,
    /// Raw controller-specific error status
    Error(u16),
}

/// Size of one DMA element.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    Bits8 = 1,
    Bits16 = 2,
    Bits32 = 4,
}

impl DataWidth {
    /// Smallest element holding a word of `word_bits` bits.
    pub fn for_word_bits(word_bits: u32) -> Option<Self> {
        match word_bits {
            0..=8 => Some(DataWidth::Bits8),
            9..=16 => Some(DataWidth::Bits16),
            17..=32 => Some(DataWidth::Bits32),
            _ => None,
        }
    }

    #[inline]
    pub fn bytes(self) -> usize {
        self as usize
    }
}

/// Parameters handed to the platform when requesting a channel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelRequest {
    /// Synchronization event of the channel
    pub sync_dev: u32,
    pub event_queue: u32,
    /// Routing for [`on_complete`]
    pub cs: u8,
    pub direction: Direction,
}

/// One programmed block transfer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaTransfer {
    pub src: DmaAddr,
    /// Source increment per element in bytes, 0 for a fixed register
    pub src_step: u8,
    pub dst: DmaAddr,
    pub dst_step: u8,
    pub width: DataWidth,
    /// Element count
    pub count: usize,
}

/// Platform DMA resources of the controller.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaResources {
    pub rx_sync_dev: u32,
    pub tx_sync_dev: u32,
    pub event_queue: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// No channel available for the request
    NoChannel,
    /// Buffer cannot be made visible to the device
    Mapping,
}

/// Platform DMA controller.
///
/// Methods take `&self`: the same handle is used by the completion callback
/// while the engine waits.
pub trait DmaController {
    fn alloc_channel(&self, req: ChannelRequest) -> Result<Channel, DmaError>;

    fn free_channel(&self, ch: Channel);

    fn configure(&self, ch: Channel, xfer: &DmaTransfer);

    fn start(&self, ch: Channel);

    fn stop(&self, ch: Channel);

    /// Drop any descriptor state left behind by a faulted transfer
    fn clean(&self, ch: Channel);

    /// Make `buf` readable by the device.
    fn map_to_device(&self, buf: &[u8]) -> Result<DmaAddr, DmaError>;

    /// Make `buf` writable by the device.
    fn map_from_device(&self, buf: &mut [u8]) -> Result<DmaAddr, DmaError>;

    /// Release a mapping of `len` bytes.
    fn unmap(&self, addr: DmaAddr, len: usize, direction: Direction);
}

impl<T: DmaController + ?Sized> DmaController for &T {
    fn alloc_channel(&self, req: ChannelRequest) -> Result<Channel, DmaError> {
        (**self).alloc_channel(req)
    }
    fn free_channel(&self, ch: Channel) {
        (**self).free_channel(ch)
    }
    fn configure(&self, ch: Channel, xfer: &DmaTransfer) {
        (**self).configure(ch, xfer)
    }
    fn start(&self, ch: Channel) {
        (**self).start(ch)
    }
    fn stop(&self, ch: Channel) {
        (**self).stop(ch)
    }
    fn clean(&self, ch: Channel) {
        (**self).clean(ch)
    }
    fn map_to_device(&self, buf: &[u8]) -> Result<DmaAddr, DmaError> {
        (**self).map_to_device(buf)
    }
    fn map_from_device(&self, buf: &mut [u8]) -> Result<DmaAddr, DmaError> {
        (**self).map_from_device(buf)
    }
    fn unmap(&self, addr: DmaAddr, len: usize, direction: Direction) {
        (**self).unmap(addr, len, direction)
    }
}

/// Placeholder controller for PIO-only instances.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoDma;

impl DmaController for NoDma {
    fn alloc_channel(&self, _req: ChannelRequest) -> Result<Channel, DmaError> {
        Err(DmaError::NoChannel)
    }
    fn free_channel(&self, _ch: Channel) {}
    fn configure(&self, _ch: Channel, _xfer: &DmaTransfer) {}
    fn start(&self, _ch: Channel) {}
    fn stop(&self, _ch: Channel) {}
    fn clean(&self, _ch: Channel) {}
    fn map_to_device(&self, _buf: &[u8]) -> Result<DmaAddr, DmaError> {
        Err(DmaError::Mapping)
    }
    fn map_from_device(&self, _buf: &mut [u8]) -> Result<DmaAddr, DmaError> {
        Err(DmaError::Mapping)
    }
    fn unmap(&self, _addr: DmaAddr, _len: usize, _direction: Direction) {}
}

/// Channel completion callback.
///
/// Called by the platform from its DMA interrupt for a channel allocated with
/// `cs` and `direction`. Stops the channel (and cleans it when the transfer
/// did not complete), hands the status to the waiting engine, and drops the
/// controller's DMA request enable.
pub fn on_complete<R: Regs, D: DmaController>(
    regs: &R,
    dma: &D,
    state: &State,
    cs: u8,
    direction: Direction,
    ch: Channel,
    status: DmaStatus,
) {
    dma.stop(ch);
    if status != DmaStatus::Complete {
        warn!("DMA {:?} channel {} failed: {:?}", direction, ch.0, status);
        dma.clean(ch);
    }

    if let Some(signals) = state.dma.get(cs as usize) {
        match direction {
            Direction::Rx => signals.rx.signal(status),
            Direction::Tx => signals.tx.signal(status),
        }
    }

    regs.clear_bits(crate::regs::Reg::Int, INT_DMA_REQ_EN);
}
