//! DMA transfers
//!
//! Transmit runs memory to SPIDAT1, receive SPIBUF to memory, one element per
//! word. A receive-only transfer is clocked by transmitting one zero-filled
//! scratch word over and over.

use embassy_futures::block_on;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::clock::ClockControl;
use crate::delay::Relax;
use crate::dma::{DataWidth, Direction, DmaController, DmaStatus, DmaTransfer};
use crate::regs::*;
use crate::state::State;

use super::{check_flags, Error, SlaveConfig, Spi};

impl<'d, R: Regs, C: ClockControl, D: DmaController, W: Relax> Spi<'d, R, C, D, W> {
    pub(super) fn transfer_dma(
        &mut self,
        cs: u8,
        slave: &SlaveConfig,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        words: usize,
    ) -> Result<(), Error> {
        let pair = self.channels(cs).ok_or(Error::DmaUnavailable)?;
        let bytes_per_word = slave.word_size.bytes();
        let width = DataWidth::for_word_bits(bytes_per_word as u32 * 8).ok_or(Error::InvalidWordWidth)?;

        let transmitting = tx.is_some();
        let receiving = rx.is_some();

        self.prepare_mode(cs, slave);

        let state = self.state;
        let _busy = state.begin();
        state.reset_dma(cs);

        self.write_delay();
        let command = self.activate(cs);

        // no controller interrupts in DMA mode
        self.regs.clear_bits(Reg::Int, INT_MASKALL);
        // the command bits must be latched before the clock starts
        self.regs.clear_bits(Reg::Gcr1, GCR1_SPIENA);
        self.regs.write(Reg::Dat1, command);
        self.regs.set_bits(Reg::Gcr1, GCR1_SPIENA);
        self.wait_rx_empty()?;

        let (tx_addr, tx_len, tx_step, tx_count) = match tx {
            Some(tx) => (self.dma.map_to_device(tx)?, tx.len(), width as u8, words),
            None => {
                let scratch = &mut self.scratch[..bytes_per_word];
                scratch.fill(0);
                // one extra word for the command latched before the channels start
                (self.dma.map_to_device(scratch)?, bytes_per_word, 0, words + 1)
            }
        };

        self.dma.configure(
            pair.tx,
            &DmaTransfer {
                src: tx_addr,
                src_step: tx_step,
                dst: self.regs.bus_addr(Reg::Dat1),
                dst_step: 0,
                width,
                count: tx_count,
            },
        );

        let mut rx_map = None;
        if let Some(rx) = rx {
            let rx_len = rx.len();
            let rx_addr = match self.dma.map_from_device(rx) {
                Ok(addr) => addr,
                Err(e) => {
                    debug!("cannot map {} byte rx buffer", rx_len);
                    self.dma.unmap(tx_addr, tx_len, Direction::Tx);
                    return Err(e.into());
                }
            };

            self.dma.configure(
                pair.rx,
                &DmaTransfer {
                    src: self.regs.bus_addr(Reg::Buf),
                    src_step: 0,
                    dst: rx_addr,
                    dst_step: width as u8,
                    width,
                    count: words,
                },
            );
            rx_map = Some((rx_addr, rx_len));
        }

        self.dma.start(pair.tx);
        if receiving {
            self.dma.start(pair.rx);
        }
        self.regs.set_bits(Reg::Int, INT_DMA_REQ_EN);

        let signals = &state.dma[cs as usize];
        let mut faulted = false;
        let mut waited = Ok(());

        if transmitting {
            match wait_channel(state, &signals.tx) {
                Ok(status) => faulted |= status != DmaStatus::Complete,
                Err(e) => waited = Err(e),
            }
        }
        if waited.is_ok() && receiving {
            match wait_channel(state, &signals.rx) {
                Ok(status) => faulted |= status != DmaStatus::Complete,
                Err(e) => waited = Err(e),
            }
        }
        if waited.is_ok() && !transmitting {
            // the scratch channel is not waited for, but its fault still counts
            if let Some(status) = signals.tx.try_take() {
                faulted |= status != DmaStatus::Complete;
            }
        }

        self.dma.unmap(tx_addr, tx_len, Direction::Tx);
        if let Some((addr, len)) = rx_map {
            self.dma.unmap(addr, len, Direction::Rx);
        }
        waited?;

        check_flags(self.regs.flags(), self.config.revision)?;
        if faulted {
            return Err(Error::DmaFault);
        }
        Ok(())
    }
}

/// Block until a channel completes or the wait is interrupted.
fn wait_channel(state: &State, signal: &Signal<CriticalSectionRawMutex, DmaStatus>) -> Result<DmaStatus, Error> {
    match block_on(select(signal.wait(), state.interrupted())) {
        Either::First(status) => Ok(status),
        Either::Second(()) => {
            debug!("DMA wait interrupted");
            Err(Error::Interrupted)
        }
    }
}
