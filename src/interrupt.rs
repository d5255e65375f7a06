//! Controller interrupt
//!
//! Only the receive interrupt is used: in interrupt-driven receive mode the
//! engine enables INT.RX for one word at a time and waits for the handler to
//! collect it.

use crate::regs::{Reg, Regs, INT_RX, INT_TX};
use crate::state::State;

/// Interrupt handler.
///
/// Bind [`InterruptHandler::on_interrupt`] to the controller's interrupt line.
pub struct InterruptHandler<'d, R: Regs> {
    regs: R,
    state: &'d State,
}

impl<'d, R: Regs> InterruptHandler<'d, R> {
    pub const fn new(regs: R, state: &'d State) -> Self {
        Self { regs, state }
    }

    /// Drain the receive buffer into the mailbox.
    ///
    /// Returns `false` if the interrupt was not raised by a received word.
    pub fn on_interrupt(&self) -> bool {
        let mut handled = false;

        while self.regs.flags().rx_intr() {
            let word = self.regs.read(Reg::Buf) as u16;
            if self.state.rx_mailbox.try_send(word).is_err() {
                warn!("rx mailbox full, dropped word {}", word);
            }
            self.regs.clear_bits(Reg::Int, INT_RX | INT_TX);
            handled = true;
        }

        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{INT_BITERR, INT_OVRRUN};
    use crate::testutils::MockSpi;

    #[test]
    fn test_spurious_interrupt() {
        let hw = MockSpi::new();
        let state = State::new();
        let irq = InterruptHandler::new(&hw, &state);

        assert!(!irq.on_interrupt());
        assert!(state.rx_mailbox.try_receive().is_err());
    }

    #[test]
    fn test_received_word_is_posted() {
        let hw = MockSpi::new();
        let state = State::new();
        hw.write(Reg::Int, INT_BITERR | INT_OVRRUN | INT_RX | INT_TX);
        hw.push_rx(0x1234);

        let irq = InterruptHandler::new(&hw, &state);
        assert!(irq.on_interrupt());

        assert_eq!(state.rx_mailbox.try_receive(), Ok(0x1234));
        // error sources stay enabled
        assert_eq!(hw.read(Reg::Int), INT_BITERR | INT_OVRRUN);
        assert!(!hw.flags().rx_intr());
    }

    #[test]
    fn test_full_mailbox_drops_word() {
        let hw = MockSpi::new();
        let state = State::new();
        for i in 0..crate::state::RX_MAILBOX_DEPTH as u16 {
            state.rx_mailbox.try_send(i).unwrap();
        }
        hw.push_rx(0xbeef);

        let irq = InterruptHandler::new(&hw, &state);
        assert!(irq.on_interrupt());
        let mut posted = std::vec::Vec::new();
        while let Ok(word) = state.rx_mailbox.try_receive() {
            posted.push(word);
        }
        assert_eq!(posted, [0, 1, 2, 3]);
    }
}
