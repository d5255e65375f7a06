//! Transfer errors and SPIFLG decoding

use crate::delay::Stalled;
use crate::dma::DmaError;
use crate::regs::Flags;

use super::Revision;

/// SPI error
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Bits per word outside 2..=16
    InvalidWordWidth,
    /// Bus frequency outside the controller's range
    FrequencyOutOfRange,
    InvalidChipSelect,
    /// Chip-select used before `setup`
    NotConfigured,
    /// Buffer length is not a whole number of words, or the buffers differ in length
    InvalidLength,
    /// Mode not available on this hardware revision
    UnsupportedMode,

    /// The peripheral did not answer in time (TIMEOUT)
    Timeout,
    /// Peripheral de-synchronized (DESYNC)
    Desync,
    /// Transmitted and sensed bus level differ (BITERR)
    BitError,
    /// Data length error (DLEN_ERR)
    DataLength,
    Parity,
    Overrun,
    /// TX_INTR still pending after the transfer
    TxInterrupt,
    /// Buffer initialization still in progress
    Busy,

    /// DMA channels could not be allocated
    DmaUnavailable,
    /// Buffer could not be mapped for DMA
    DmaMapping,
    /// DMA channel reported an error
    DmaFault,

    /// A transfer did not finish before suspend
    SuspendTimeout,
    /// DMA wait cancelled
    Interrupted,
    /// A status poll exceeded `Config::poll_limit`
    Stalled,
}

impl Error {
    /// OS-style error code.
    pub fn errno(&self) -> i32 {
        const EINTR: i32 = 4;
        const EIO: i32 = 5;
        const EAGAIN: i32 = 11;
        const ENOMEM: i32 = 12;
        const EBUSY: i32 = 16;
        const EINVAL: i32 = 22;
        const ETIMEDOUT: i32 = 110;

        match self {
            Error::InvalidWordWidth
            | Error::FrequencyOutOfRange
            | Error::InvalidChipSelect
            | Error::NotConfigured
            | Error::InvalidLength
            | Error::UnsupportedMode => EINVAL,
            Error::Timeout | Error::SuspendTimeout | Error::Stalled => ETIMEDOUT,
            Error::Desync
            | Error::BitError
            | Error::DataLength
            | Error::Parity
            | Error::Overrun
            | Error::TxInterrupt
            | Error::DmaFault => EIO,
            Error::Busy => EBUSY,
            Error::DmaUnavailable => EAGAIN,
            Error::DmaMapping => ENOMEM,
            Error::Interrupted => EINTR,
        }
    }

    /// Whether repeating the same transfer may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Busy | Error::DmaUnavailable | Error::Interrupted)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        match e {
            DmaError::NoChannel => Error::DmaUnavailable,
            DmaError::Mapping => Error::DmaMapping,
        }
    }
}

impl From<Stalled> for Error {
    fn from(_: Stalled) -> Self {
        Error::Stalled
    }
}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        match self {
            Self::Overrun => embedded_hal::spi::ErrorKind::Overrun,
            Self::Desync | Self::DataLength => embedded_hal::spi::ErrorKind::FrameFormat,
            _ => embedded_hal::spi::ErrorKind::Other,
        }
    }
}

/// Decode the status flags left by a transfer.
///
/// Faults are reported one at a time, the most severe first. Revision 1
/// hardware only flags timeout, desync and bit errors.
pub fn check_flags(flags: Flags, revision: Revision) -> Result<(), Error> {
    if flags.timeout() {
        debug!("SPI time-out error");
        return Err(Error::Timeout);
    }
    if flags.desync() {
        debug!("SPI desynchronization error");
        return Err(Error::Desync);
    }
    if flags.bit_err() {
        debug!("SPI bit error");
        return Err(Error::BitError);
    }

    if revision == Revision::V2 {
        if flags.dlen_err() {
            debug!("SPI data length error");
            return Err(Error::DataLength);
        }
        if flags.parity_err() {
            debug!("SPI parity error");
            return Err(Error::Parity);
        }
        if flags.overrun() {
            debug!("SPI data overrun error");
            return Err(Error::Overrun);
        }
        if flags.tx_intr() {
            debug!("SPI TX interrupt pending");
            return Err(Error::TxInterrupt);
        }
        if flags.buf_init_active() {
            debug!("SPI buffer init active");
            return Err(Error::Busy);
        }
    }

    Ok(())
}
