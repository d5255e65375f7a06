//! Programmed I/O transfers

use crate::clock::ClockControl;
use crate::delay::{spin_until, Relax};
use crate::dma::DmaController;
use crate::regs::*;

use super::{check_flags, Error, SlaveConfig, Spi};

impl<'d, R: Regs, C: ClockControl, D: DmaController, W: Relax> Spi<'d, R, C, D, W> {
    pub(super) fn transfer_pio(
        &mut self,
        cs: u8,
        slave: &SlaveConfig,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        words: usize,
    ) -> Result<(), Error> {
        self.prepare_mode(cs, slave);

        let state = self.state;
        let _busy = state.begin();

        self.regs.set_bits(Reg::Gcr1, GCR1_SPIENA);
        self.write_delay();
        let command = self.activate(cs);
        self.wait_rx_empty()?;

        match (tx, rx) {
            (Some(tx), mut rx) => {
                self.regs.clear_bits(Reg::Int, INT_MASKALL);

                for i in 0..words {
                    let word = slave.word_size.get(tx, i);
                    self.wait_tx_ready()?;
                    self.regs.write(Reg::Dat1, command & !0xffff | word as u32);

                    // always read, the receive slot must be drained
                    let rx_word = self.read_rx_word()?;
                    if let Some(rx) = rx.as_deref_mut() {
                        slave.word_size.put(rx, i, rx_word);
                    }
                }
            }
            (None, Some(rx)) if self.config.poll_mode => {
                for i in 0..words {
                    // keeps the bus clock running
                    self.wait_tx_ready()?;
                    self.regs.write(Reg::Dat1, command);

                    let rx_word = self.read_rx_word()?;
                    slave.word_size.put(rx, i, rx_word);
                }
            }
            (None, Some(rx)) => {
                for i in 0..words {
                    self.regs.set_bits(Reg::Int, INT_BITERR | INT_OVRRUN | INT_RX);
                    self.regs.write(Reg::Dat1, command);

                    // INT.RX is dropped by the interrupt handler once it has the word
                    let regs = &self.regs;
                    spin_until(&mut self.relax, self.config.poll_limit, || {
                        regs.read(Reg::Int) & INT_RX == 0
                    })?;

                    let rx_word = state.rx_mailbox.try_receive().map_err(|_| Error::Overrun)?;
                    slave.word_size.put(rx, i, rx_word);
                }
                self.regs.write(Reg::Dat1, command & DAT1_RELEASE_MASK);
            }
            (None, None) => {}
        }

        check_flags(self.regs.flags(), self.config.revision)
    }

    fn wait_tx_ready(&mut self) -> Result<(), Error> {
        let regs = &self.regs;
        spin_until(&mut self.relax, self.config.poll_limit, || {
            regs.read(Reg::Buf) & BUF_TXFULL == 0
        })?;
        Ok(())
    }

    /// Poll SPIBUF until it holds a received word and return it.
    fn read_rx_word(&mut self) -> Result<u16, Error> {
        let regs = &self.regs;
        let mut buf = 0;
        spin_until(&mut self.relax, self.config.poll_limit, || {
            buf = regs.read(Reg::Buf);
            buf & BUF_RXEMPTY == 0
        })?;
        Ok(buf as u16)
    }
}
