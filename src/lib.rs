#![cfg_attr(not(test), no_std)]

// This must go FIRST so that all the other modules see its macros.
#[macro_use]
mod fmt;

pub mod clock;
pub mod delay;
pub mod dma;
pub mod interrupt;
pub mod regs;
pub mod spi;
pub mod state;

pub use fugit::HertzU32 as Hertz;

pub use crate::spi::{Config, DeviceConfig, Error, Spi, Transfer};
pub use crate::state::State;

#[cfg(test)]
mod testutils;
