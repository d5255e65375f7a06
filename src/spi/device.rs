//! embedded-hal device binding

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

use crate::clock::ClockControl;
use crate::delay::Relax;
use crate::dma::DmaController;
use crate::regs::Regs;

use super::{ChipSelect, Error, Spi, Transfer};

/// Bytes moved per transfer by `TransferInPlace`
const IN_PLACE_CHUNK: usize = 64;

/// One chip-select of a [`Spi`], usable as an [`SpiDevice`].
///
/// The chip-select is released at the end of every transaction.
pub struct Device<'a, 'd, R: Regs, C: ClockControl, D: DmaController, W: Relax, Dl> {
    spi: &'a mut Spi<'d, R, C, D, W>,
    cs: u8,
    delay: Dl,
}

impl<'a, 'd, R: Regs, C: ClockControl, D: DmaController, W: Relax, Dl: DelayNs> Device<'a, 'd, R, C, D, W, Dl> {
    pub(super) fn new(spi: &'a mut Spi<'d, R, C, D, W>, cs: u8, delay: Dl) -> Self {
        Self { spi, cs, delay }
    }

    fn run(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Error> {
        let cs = self.cs;
        for op in operations {
            match op {
                Operation::Read(buf) => {
                    self.spi.transfer(cs, Transfer::read(&mut buf[..]))?;
                }
                Operation::Write(buf) => {
                    self.spi.transfer(cs, Transfer::write(&buf[..]))?;
                }
                Operation::Transfer(read, write) => {
                    let n = read.len().min(write.len());
                    let (read_head, read_tail) = read.split_at_mut(n);
                    let (write_head, write_tail) = write.split_at(n);

                    self.spi.transfer(cs, Transfer::transfer(write_head, read_head))?;
                    if !read_tail.is_empty() {
                        self.spi.transfer(cs, Transfer::read(read_tail))?;
                    }
                    if !write_tail.is_empty() {
                        self.spi.transfer(cs, Transfer::write(write_tail))?;
                    }
                }
                Operation::TransferInPlace(buf) => {
                    for chunk in buf.chunks_mut(IN_PLACE_CHUNK) {
                        let mut out = [0u8; IN_PLACE_CHUNK];
                        let out = &mut out[..chunk.len()];
                        out.copy_from_slice(chunk);
                        self.spi.transfer(cs, Transfer::transfer(out, chunk))?;
                    }
                }
                Operation::DelayNs(ns) => self.delay.delay_ns(*ns),
            }
        }
        Ok(())
    }
}

impl<'a, 'd, R: Regs, C: ClockControl, D: DmaController, W: Relax, Dl> ErrorType for Device<'a, 'd, R, C, D, W, Dl> {
    type Error = Error;
}

impl<'a, 'd, R: Regs, C: ClockControl, D: DmaController, W: Relax, Dl: DelayNs> SpiDevice<u8>
    for Device<'a, 'd, R, C, D, W, Dl>
{
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let result = self.run(operations);
        let released = self.spi.chip_select(self.cs, ChipSelect::Inactive);
        result.and(released)
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::spi::SpiDevice;

    use super::super::{Config, DeviceConfig};
    use super::*;
    use crate::regs::{Reg, CS_DEFAULT, DAT1_CSNR_SHIFT};
    use crate::state::State;
    use crate::testutils::{MockClock, MockDelay, MockSpi};

    fn loopback() -> DeviceConfig {
        DeviceConfig {
            loopback: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_transaction_releases_chip_select() {
        let hw = MockSpi::new();
        let clock = MockClock::new(50_000_000);
        let state = State::new();
        let mut spi = Spi::new_blocking(&hw, &clock, &state, &mut MockDelay::default(), Config::default()).unwrap();
        spi.setup(1, &loopback()).unwrap();

        let mut dev = spi.device(1, MockDelay::default()).unwrap();
        let mut buf = [0u8; 2];
        dev.transaction(&mut [
            Operation::Write(&[0x9f]),
            Operation::DelayNs(500),
            Operation::Read(&mut buf),
        ])
        .unwrap();

        assert_eq!(hw.dat1_writes().last(), Some(&((CS_DEFAULT as u32) << DAT1_CSNR_SHIFT)));
        assert_eq!(hw.read(Reg::Def), CS_DEFAULT as u32);
    }

    #[test]
    fn test_uneven_transfer_is_split() {
        let hw = MockSpi::new();
        let clock = MockClock::new(50_000_000);
        let state = State::new();
        let mut spi = Spi::new_blocking(&hw, &clock, &state, &mut MockDelay::default(), Config::default()).unwrap();
        spi.setup(0, &loopback()).unwrap();

        let mut dev = spi.device(0, MockDelay::default()).unwrap();
        let mut read = [0u8; 2];
        dev.transfer(&mut read, &[1, 2, 3, 4]).unwrap();
        assert_eq!(read, [1, 2]);

        // the deselect word follows the data
        assert_eq!(hw.shifted()[..4], [1, 2, 3, 4]);
    }

    #[test]
    fn test_transfer_in_place() {
        let hw = MockSpi::new();
        let clock = MockClock::new(50_000_000);
        let state = State::new();
        let mut spi = Spi::new_blocking(&hw, &clock, &state, &mut MockDelay::default(), Config::default()).unwrap();
        spi.setup(0, &loopback()).unwrap();

        let mut dev = spi.device(0, MockDelay::default()).unwrap();
        let mut buf = [0u8; 100];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = i as u8;
        }
        let expected = buf;
        dev.transfer_in_place(&mut buf).unwrap();
        assert_eq!(buf, expected);
        assert_eq!(hw.shifted().len(), 101);
    }

    #[test]
    fn test_unconfigured_chip_select() {
        let hw = MockSpi::new();
        let clock = MockClock::new(50_000_000);
        let state = State::new();
        let mut spi = Spi::new_blocking(&hw, &clock, &state, &mut MockDelay::default(), Config::default()).unwrap();

        assert_eq!(spi.device(0, MockDelay::default()).err(), Some(Error::NotConfigured));
        assert_eq!(spi.device(9, MockDelay::default()).err(), Some(Error::InvalidChipSelect));
    }
}
