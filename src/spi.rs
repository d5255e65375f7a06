//! SPI master
//!
//! Transfer engine of the DaVinci / DA8xx SPI controller.
//!
//! - Master mode only, up to 4 chip-selects, one SPIFMTn format per chip-select
//! - 2 to 16 bits per word, MSB or LSB first, all four clock modes
//! - Bus clock between 600 kHz and 50 MHz
//! - PIO transfers, polled or with an interrupt-driven receive path
//! - DMA transfers over two channels per chip-select
//! - Revision 2 adds parity, handshake (SPIx_ENA) and extended error flags

use aligned::{Aligned, A4};
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Mode, Phase, Polarity, MODE_0};
use fugit::HertzU32 as Hertz;
use heapless::Vec;

use crate::clock::{calculate_prescale, ClockControl};
use crate::delay::{spin_until, Relax, SpinRelax};
use crate::dma::{ChannelPair, ChannelRequest, Direction, DmaController, DmaResources, NoDma};
use crate::regs::*;
use crate::state::State;

mod device;
mod dma;
pub mod error;
mod pio;
pub mod timing;

pub use device::Device;
pub use error::{check_flags, Error};

/// Chip-selects the controller can address, one per SPIFMTn register
pub const MAX_CHIPSELECT: usize = FMT_COUNT as usize;

/// Size of the zero word clocking receive-only DMA transfers, one 32-bit element
pub const SCRATCH_SIZE: usize = 4;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    LsbFirst,
    MsbFirst,
}

/// Controller hardware revision.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Revision {
    /// DM355, DM365, DM6467
    V1,
    /// DA8xx, with parity, handshake and extended error flags
    V2,
}

/// How words are moved between memory and the controller.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStrategy {
    Pio,
    Dma,
}

/// Memory footprint of one word.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordSize {
    /// 2 to 8 bits per word
    One,
    /// 9 to 16 bits per word, native byte order in memory
    Two,
}

impl WordSize {
    pub fn from_bits(bits_per_word: u8) -> Result<Self, Error> {
        match bits_per_word {
            2..=8 => Ok(WordSize::One),
            9..=16 => Ok(WordSize::Two),
            _ => Err(Error::InvalidWordWidth),
        }
    }

    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            WordSize::One => 1,
            WordSize::Two => 2,
        }
    }

    /// Word `index` of `buf`, all ones past the end.
    pub(crate) fn get(self, buf: &[u8], index: usize) -> u16 {
        match self {
            WordSize::One => buf.get(index).map_or(0xff, |b| *b as u16),
            WordSize::Two => buf
                .get(2 * index..2 * index + 2)
                .map_or(0xffff, |b| u16::from_ne_bytes([b[0], b[1]])),
        }
    }

    pub(crate) fn put(self, buf: &mut [u8], index: usize, word: u16) {
        match self {
            WordSize::One => {
                if let Some(b) = buf.get_mut(index) {
                    *b = word as u8;
                }
            }
            WordSize::Two => {
                if let Some(b) = buf.get_mut(2 * index..2 * index + 2) {
                    b.copy_from_slice(&word.to_ne_bytes());
                }
            }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelect {
    Active,
    Inactive,
}

/// Input clock rate change notification.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockEvent {
    PreChange,
    PostChange,
}

/// Controller configuration, fixed for the lifetime of the driver.
#[non_exhaustive]
#[derive(Copy, Clone, Debug)]
pub struct Config {
    /// Chip-selects in use, 1 to 4
    pub num_chipselect: u8,
    pub revision: Revision,
    /// Keep the chip-select asserted between words
    pub cs_hold: bool,
    /// Wait for the peripheral's SPIx_ENA handshake (revision 2)
    pub wait_enable: bool,
    /// Disable the C2T/T2C delays (revision 2)
    pub timer_disable: bool,
    pub parity_enable: bool,
    pub odd_parity: bool,
    /// Delay between words in bus clock cycles, 6 bits (revision 2)
    pub wdelay: u8,
    /// Chip-select active to transmit start delay
    pub c2t_delay: u8,
    /// Transmit end to chip-select inactive delay
    pub t2c_delay: u8,
    /// Poll the receive buffer instead of using the receive interrupt
    pub poll_mode: bool,
    /// Generate the bus clock internally
    pub clk_internal: bool,
    /// Route controller interrupts to INT1 instead of INT0
    pub intr_level: bool,
    /// Give up a status poll after this many attempts, `None` polls forever
    pub poll_limit: Option<u32>,
    /// How long `suspend` waits for a transfer in flight
    pub suspend_timeout: embassy_time::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_chipselect: MAX_CHIPSELECT as u8,
            revision: Revision::V1,
            cs_hold: true,
            wait_enable: false,
            timer_disable: false,
            parity_enable: false,
            odd_parity: false,
            wdelay: 0,
            c2t_delay: 0,
            t2c_delay: 0,
            poll_mode: true,
            clk_internal: true,
            intr_level: false,
            poll_limit: None,
            suspend_timeout: timing::MAX_TRANSFER_TIME,
        }
    }
}

/// Peripheral attached to one chip-select.
#[non_exhaustive]
#[derive(Copy, Clone, Debug)]
pub struct DeviceConfig {
    pub mode: Mode,
    pub bit_order: BitOrder,
    /// 0 selects 8
    pub bits_per_word: u8,
    pub max_frequency: Hertz,
    /// Internal MOSI to MISO loopback
    pub loopback: bool,
    /// 3-pin mode, the chip-select pin is not driven
    pub no_cs: bool,
    /// Use the SPIx_ENA handshake pin (revision 2)
    pub ready: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mode: MODE_0,
            bit_order: BitOrder::MsbFirst,
            bits_per_word: 8,
            max_frequency: Hertz::from_raw(1_000_000),
            loopback: false,
            no_cs: false,
            ready: false,
        }
    }
}

/// One transfer on the bus.
///
/// With both buffers present they must have the same length.
#[derive(Debug, Default)]
pub struct Transfer<'a> {
    pub tx: Option<&'a [u8]>,
    pub rx: Option<&'a mut [u8]>,
    /// Overrides the chip-select's word width for this transfer
    pub bits_per_word: Option<u8>,
    /// Overrides the chip-select's bus frequency for this transfer
    pub speed: Option<Hertz>,
}

impl<'a> Transfer<'a> {
    pub fn write(tx: &'a [u8]) -> Self {
        Self {
            tx: Some(tx),
            ..Default::default()
        }
    }

    pub fn read(rx: &'a mut [u8]) -> Self {
        Self {
            rx: Some(rx),
            ..Default::default()
        }
    }

    pub fn transfer(tx: &'a [u8], rx: &'a mut [u8]) -> Self {
        Self {
            tx: Some(tx),
            rx: Some(rx),
            ..Default::default()
        }
    }

    pub fn with_bits_per_word(mut self, bits_per_word: u8) -> Self {
        self.bits_per_word = Some(bits_per_word);
        self
    }

    pub fn with_speed(mut self, speed: Hertz) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Length in bytes.
    fn len(&self) -> Result<usize, Error> {
        match (&self.tx, &self.rx) {
            (Some(tx), Some(rx)) if tx.len() != rx.len() => Err(Error::InvalidLength),
            (Some(tx), _) => Ok(tx.len()),
            (None, Some(rx)) => Ok(rx.len()),
            (None, None) => Ok(0),
        }
    }
}

/// Transfer parameters of one chip-select.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SlaveConfig {
    pub word_size: WordSize,
    pub bits_per_word: u8,
    /// Bus frequency the divider was last computed for
    pub speed: Hertz,
    pub default_bits: u8,
    pub max_frequency: Hertz,
    pub loopback: bool,
    pub no_cs: bool,
    pub ready: bool,
    /// SPIDAT1 command bits of the last activation
    pub command: u32,
}

/// SPI master driver
pub struct Spi<'d, R: Regs, C: ClockControl, D: DmaController = NoDma, W: Relax = SpinRelax> {
    regs: R,
    clock: C,
    dma: D,
    relax: W,
    state: &'d State,
    config: Config,
    strategy: TransferStrategy,
    slaves: Vec<Option<SlaveConfig>, MAX_CHIPSELECT>,
    channels: Vec<Option<ChannelPair>, MAX_CHIPSELECT>,
    resources: Option<DmaResources>,
    scratch: Aligned<A4, [u8; SCRATCH_SIZE]>,
}

impl<'d, R: Regs, C: ClockControl> Spi<'d, R, C, NoDma, SpinRelax> {
    /// Create a PIO driver and reset the controller.
    pub fn new_blocking(
        regs: R,
        clock: C,
        state: &'d State,
        delay: &mut impl DelayNs,
        config: Config,
    ) -> Result<Self, Error> {
        Self::new_inner(regs, clock, NoDma, None, state, delay, config)
    }
}

impl<'d, R: Regs, C: ClockControl, D: DmaController> Spi<'d, R, C, D, SpinRelax> {
    /// Create a DMA driver and reset the controller.
    ///
    /// Channels are allocated per chip-select by [`Spi::setup`].
    pub fn new_with_dma(
        regs: R,
        clock: C,
        dma: D,
        resources: DmaResources,
        state: &'d State,
        delay: &mut impl DelayNs,
        config: Config,
    ) -> Result<Self, Error> {
        Self::new_inner(regs, clock, dma, Some(resources), state, delay, config)
    }

    fn new_inner(
        regs: R,
        mut clock: C,
        dma: D,
        resources: Option<DmaResources>,
        state: &'d State,
        delay: &mut impl DelayNs,
        config: Config,
    ) -> Result<Self, Error> {
        let n = config.num_chipselect as usize;
        if n == 0 || n > MAX_CHIPSELECT {
            return Err(Error::InvalidChipSelect);
        }

        let mut slaves = Vec::new();
        let mut channels = Vec::new();
        slaves.resize(n, None).map_err(|_| Error::InvalidChipSelect)?;
        channels.resize(n, None).map_err(|_| Error::InvalidChipSelect)?;

        clock.enable();

        // module reset
        regs.write(Reg::Gcr0, 0);
        delay.delay_us(timing::RESET_DELAY_US);
        regs.write(Reg::Gcr0, 1);

        regs.set_or_clear(Reg::Gcr1, GCR1_CLKMOD, config.clk_internal);
        regs.set_bits(Reg::Gcr1, GCR1_MASTER);
        regs.write(
            Reg::Lvl,
            if config.intr_level { LVL_ALL_INT1 } else { LVL_ALL_INT0 },
        );

        let strategy = match resources {
            Some(res) => {
                info!(
                    "SPI in DMA mode, rx sync {} tx sync {} event queue {}",
                    res.rx_sync_dev,
                    res.tx_sync_dev,
                    res.event_queue
                );
                TransferStrategy::Dma
            }
            None if config.poll_mode => {
                info!("SPI in PIO mode, polled receive");
                TransferStrategy::Pio
            }
            None => {
                info!("SPI in PIO mode, interrupt-driven receive");
                TransferStrategy::Pio
            }
        };

        Ok(Self {
            regs,
            clock,
            dma,
            relax: SpinRelax,
            state,
            config,
            strategy,
            slaves,
            channels,
            resources,
            scratch: Aligned([0; SCRATCH_SIZE]),
        })
    }
}

impl<'d, R: Regs, C: ClockControl, D: DmaController, W: Relax> Spi<'d, R, C, D, W> {
    /// Replace the step taken between two polls of a hardware flag.
    pub fn with_relax<W2: Relax>(self, relax: W2) -> Spi<'d, R, C, D, W2> {
        let Spi {
            regs,
            clock,
            dma,
            relax: _,
            state,
            config,
            strategy,
            slaves,
            channels,
            resources,
            scratch,
        } = self;
        Spi {
            regs,
            clock,
            dma,
            relax,
            state,
            config,
            strategy,
            slaves,
            channels,
            resources,
            scratch,
        }
    }

    /// Release all chip-selects, stop the controller and hand back its resources.
    pub fn release(mut self) -> (R, C, D) {
        for cs in 0..self.slaves.len() as u8 {
            self.cleanup(cs);
        }
        self.regs.clear_bits(Reg::Gcr1, GCR1_SPIENA);
        self.clock.disable();
        (self.regs, self.clock, self.dma)
    }

    pub fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &'d State {
        self.state
    }

    /// Word size of a configured chip-select.
    pub fn word_size(&self, cs: u8) -> Option<WordSize> {
        self.slave(cs).ok().map(|s| s.word_size)
    }

    /// Bus frequency a configured chip-select was last set up for.
    pub fn frequency(&self, cs: u8) -> Option<Hertz> {
        self.slave(cs).ok().map(|s| s.speed)
    }

    /// DMA channels of a chip-select, if allocated.
    pub fn channels(&self, cs: u8) -> Option<ChannelPair> {
        self.channels.get(cs as usize).copied().flatten()
    }

    /// Configure a chip-select for a peripheral.
    ///
    /// Everything is validated before the hardware is touched. Running it
    /// again with the same parameters leaves the controller unchanged.
    pub fn setup(&mut self, cs: u8, dev: &DeviceConfig) -> Result<(), Error> {
        let idx = self.check_cs(cs)?;

        let bits_per_word = if dev.bits_per_word == 0 { 8 } else { dev.bits_per_word };
        let word_size = WordSize::from_bits(bits_per_word)?;
        check_frequency(dev.max_frequency)?;
        if dev.ready && self.config.revision == Revision::V1 {
            return Err(Error::UnsupportedMode);
        }

        if self.strategy == TransferStrategy::Dma && self.channels[idx].is_none() {
            self.channels[idx] = Some(self.request_dma(cs)?);
        }

        self.slaves[idx] = Some(SlaveConfig {
            word_size,
            bits_per_word,
            speed: dev.max_frequency,
            default_bits: bits_per_word,
            max_frequency: dev.max_frequency,
            loopback: dev.loopback,
            no_cs: dev.no_cs,
            ready: dev.ready,
            command: 0,
        });

        let config = self.config;
        self.regs.modify_fmt(cs, |fmt| {
            fmt.set_shiftdir(dev.bit_order == BitOrder::LsbFirst);
            fmt.set_polarity(dev.mode.polarity == Polarity::IdleHigh);
            fmt.set_phase(dev.mode.phase == Phase::CaptureOnFirstTransition);

            if config.revision == Revision::V2 {
                fmt.set_wdelay(config.wdelay as u32 & 0x3f);
                fmt.set_odd_parity(config.odd_parity);
                fmt.set_parityena(config.parity_enable);
                fmt.set_waitena(config.wait_enable);
                fmt.set_distimer(config.timer_disable);
            }
        });

        self.setup_transfer(cs, None, None)
    }

    /// Apply word width and bus frequency to a configured chip-select.
    ///
    /// `None` falls back to the values given to [`Spi::setup`].
    pub fn setup_transfer(
        &mut self,
        cs: u8,
        bits_per_word: Option<u8>,
        hz: Option<Hertz>,
    ) -> Result<(), Error> {
        let (word_size, bits_per_word, hz) = self.resolve(cs, bits_per_word, hz)?;
        self.apply(cs, word_size, bits_per_word, hz);
        Ok(())
    }

    /// Release the DMA channels of a chip-select and forget its configuration.
    pub fn cleanup(&mut self, cs: u8) {
        if let Some(pair) = self.channels.get_mut(cs as usize).and_then(Option::take) {
            self.dma.free_channel(pair.tx);
            self.dma.free_channel(pair.rx);
        }
        if let Some(slave) = self.slaves.get_mut(cs as usize) {
            *slave = None;
        }
    }

    /// Run one transfer and return the number of bytes moved.
    pub fn transfer(&mut self, cs: u8, t: Transfer<'_>) -> Result<usize, Error> {
        let len = t.len()?;
        let Transfer {
            tx,
            rx,
            bits_per_word,
            speed,
        } = t;

        let (word_size, bits, hz) = self.resolve(cs, bits_per_word, speed)?;
        if len % word_size.bytes() != 0 {
            return Err(Error::InvalidLength);
        }
        self.apply(cs, word_size, bits, hz);

        let words = len / word_size.bytes();
        if words == 0 {
            return Ok(0);
        }

        let slave = *self.slave(cs)?;
        match self.strategy {
            TransferStrategy::Pio => self.transfer_pio(cs, &slave, tx, rx, words)?,
            TransferStrategy::Dma => self.transfer_dma(cs, &slave, tx, rx, words)?,
        }
        Ok(len)
    }

    /// Drive the chip-select lines.
    ///
    /// Activation happens as part of every transfer, so only deactivation
    /// touches the hardware here: all lines go to their default level and any
    /// word still in flight is drained.
    pub fn chip_select(&mut self, cs: u8, value: ChipSelect) -> Result<(), Error> {
        self.check_cs(cs)?;
        if value == ChipSelect::Inactive {
            self.regs.set_bits(Reg::Def, CS_DEFAULT as u32);
            self.regs.write(Reg::Dat1, (CS_DEFAULT as u32) << DAT1_CSNR_SHIFT);
            self.wait_rx_empty()?;
        }
        Ok(())
    }

    /// Input clock rate change hook.
    ///
    /// `PreChange` blocks until no transfer is in flight. A hook running in
    /// another context than the one driving transfers cannot take `&mut Spi`
    /// while a transfer holds it; it must first wait on the shared [`State`]
    /// (`blocking_wait_idle` or `wait_idle_timeout`) and only then take the
    /// driver.
    pub fn clock_event(&mut self, event: ClockEvent) {
        match event {
            ClockEvent::PreChange => self.state.blocking_wait_idle(),
            ClockEvent::PostChange => {
                let rate = self.clock.rate();
                for cs in 0..self.slaves.len() {
                    if let Some(slave) = self.slaves[cs] {
                        self.write_prescale(cs as u8, calculate_prescale(rate, slave.speed));
                    }
                }
            }
        }
    }

    /// Stop the controller and gate its clock.
    ///
    /// Fails without touching the hardware if a transfer in flight does not
    /// finish within `Config::suspend_timeout`. Like [`Spi::clock_event`], a
    /// power hook in another context coordinates through [`State`] before it
    /// takes the driver.
    pub fn suspend(&mut self) -> Result<(), Error> {
        if self.state.in_use() && !self.state.wait_idle_timeout(self.config.suspend_timeout) {
            error!("SPI controller timed out");
            return Err(Error::SuspendTimeout);
        }

        self.regs.clear_bits(Reg::Gcr1, GCR1_SPIENA);
        self.clock.disable();
        Ok(())
    }

    pub fn resume(&mut self) {
        self.clock.enable();
        self.regs.set_bits(Reg::Gcr1, GCR1_SPIENA);
    }

    /// Bind a chip-select to an [`embedded_hal::spi::SpiDevice`].
    pub fn device<Dl: DelayNs>(&mut self, cs: u8, delay: Dl) -> Result<Device<'_, 'd, R, C, D, W, Dl>, Error> {
        self.slave(cs)?;
        Ok(Device::new(self, cs, delay))
    }

    fn check_cs(&self, cs: u8) -> Result<usize, Error> {
        if (cs as usize) < self.slaves.len() {
            Ok(cs as usize)
        } else {
            Err(Error::InvalidChipSelect)
        }
    }

    pub(crate) fn slave(&self, cs: u8) -> Result<&SlaveConfig, Error> {
        self.slaves
            .get(cs as usize)
            .ok_or(Error::InvalidChipSelect)?
            .as_ref()
            .ok_or(Error::NotConfigured)
    }

    fn resolve(
        &self,
        cs: u8,
        bits_per_word: Option<u8>,
        hz: Option<Hertz>,
    ) -> Result<(WordSize, u8, Hertz), Error> {
        let slave = self.slave(cs)?;

        let bits_per_word = bits_per_word.filter(|b| *b != 0).unwrap_or(slave.default_bits);
        let word_size = WordSize::from_bits(bits_per_word)?;

        let hz = match hz.filter(|hz| hz.to_Hz() != 0) {
            Some(hz) => {
                check_frequency(hz)?;
                hz
            }
            None => slave.max_frequency,
        };

        Ok((word_size, bits_per_word, hz))
    }

    fn apply(&mut self, cs: u8, word_size: WordSize, bits_per_word: u8, hz: Hertz) {
        if let Some(Some(slave)) = self.slaves.get_mut(cs as usize) {
            slave.word_size = word_size;
            slave.bits_per_word = bits_per_word;
            slave.speed = hz;
        }

        self.regs.modify_fmt(cs, |fmt| fmt.set_charlen(bits_per_word as u32 & 0x1f));
        let prescale = calculate_prescale(self.clock.rate(), hz);
        self.write_prescale(cs, prescale);
    }

    fn write_prescale(&self, cs: u8, prescale: u8) {
        self.regs.modify_fmt(cs, |fmt| fmt.set_prescale(prescale as u32));
    }

    /// Allocate both DMA channels of a chip-select, or none.
    fn request_dma(&self, cs: u8) -> Result<ChannelPair, Error> {
        let res = self.resources.ok_or(Error::DmaUnavailable)?;

        let rx = self.dma.alloc_channel(ChannelRequest {
            sync_dev: res.rx_sync_dev,
            event_queue: res.event_queue,
            cs,
            direction: Direction::Rx,
        })?;
        let tx = match self.dma.alloc_channel(ChannelRequest {
            sync_dev: res.tx_sync_dev,
            event_queue: res.event_queue,
            cs,
            direction: Direction::Tx,
        }) {
            Ok(tx) => tx,
            Err(e) => {
                self.dma.free_channel(rx);
                return Err(e.into());
            }
        };

        debug!("cs {}: DMA rx channel {} tx channel {}", cs, rx.0, tx.0);
        Ok(ChannelPair { rx, tx })
    }

    /// Pin functions and loopback for the peripheral about to be addressed.
    fn prepare_mode(&self, cs: u8, slave: &SlaveConfig) {
        let mut op_mode = PC0_DIFUN | PC0_DOFUN | PC0_CLKFUN;
        if !slave.no_cs {
            op_mode |= 1 << cs;
        }
        if slave.ready {
            op_mode |= PC0_SPIENA;
        }
        self.regs.write(Reg::Pc0, op_mode);
        self.regs.set_or_clear(Reg::Gcr1, GCR1_LOOPBACK, slave.loopback);
    }

    fn write_delay(&self) {
        self.regs.write(
            Reg::Delay,
            (self.config.c2t_delay as u32) << DELAY_C2T_SHIFT | (self.config.t2c_delay as u32) << DELAY_T2C_SHIFT,
        );
    }

    /// Select `cs` and return the SPIDAT1 command bits for its words.
    fn activate(&mut self, cs: u8) -> u32 {
        let pattern = !(1u8 << cs);
        self.regs.clear_bits(Reg::Def, !pattern as u32);

        let mut dat1 = Dat1(0);
        dat1.set_cshold(self.config.cs_hold);
        dat1.set_csnr(pattern as u32);
        dat1.set_dfsel(cs as u32);

        if let Some(Some(slave)) = self.slaves.get_mut(cs as usize) {
            slave.command = dat1.0;
        }
        dat1.0
    }

    fn wait_rx_empty(&mut self) -> Result<(), Error> {
        let regs = &self.regs;
        spin_until(&mut self.relax, self.config.poll_limit, || {
            regs.read(Reg::Buf) & BUF_RXEMPTY != 0
        })?;
        Ok(())
    }
}

fn check_frequency(hz: Hertz) -> Result<(), Error> {
    if hz < timing::MIN_FREQUENCY || hz > timing::MAX_FREQUENCY {
        debug!("operating frequency {} Hz not in acceptable range", hz.to_Hz());
        return Err(Error::FrequencyOutOfRange);
    }
    Ok(())
}
