//! Input clock and bus clock divider

use fugit::HertzU32 as Hertz;

/// Lowest prescale the controller accepts
pub const MIN_PRESCALE: u32 = 2;
pub const MAX_PRESCALE: u32 = 0xff;

/// Handle of the controller's functional input clock.
pub trait ClockControl {
    /// Current rate of the input clock
    fn rate(&self) -> Hertz;

    fn enable(&mut self);

    fn disable(&mut self);
}

/// A clock with a fixed rate and no gating control.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FixedClock {
    pub rate: Hertz,
}

impl FixedClock {
    pub const fn new(rate: Hertz) -> Self {
        Self { rate }
    }
}

impl ClockControl for FixedClock {
    fn rate(&self) -> Hertz {
        self.rate
    }

    fn enable(&mut self) {}

    fn disable(&mut self) {}
}

/// Compute SPIFMTn.PRESCALE for a bus clock of at most `hz`.
///
/// The bus runs at `clk_rate / (prescale + 1)`. Requests the divider cannot
/// honour exactly are rounded towards a slower bus; requests faster than
/// `clk_rate / 3` are silently limited by the hardware floor.
pub fn calculate_prescale(clk_rate: Hertz, hz: Hertz) -> u8 {
    let clk = clk_rate.to_Hz() as u64;
    let hz = hz.to_Hz().max(1) as u64;

    let mut prescale = (clk / hz).saturating_sub(1);
    // integer division rounds the divisor down, i.e. the bus clock up
    if clk > hz * (prescale + 1) {
        prescale += 1;
    }

    let prescale = prescale.min(MAX_PRESCALE as u64) as u32;
    if prescale < MIN_PRESCALE {
        info!("min. prescale value is {}, requested {}", MIN_PRESCALE, prescale);
        return MIN_PRESCALE as u8;
    }
    prescale as u8
}

/// Bus frequency achieved with `prescale`.
#[inline]
pub fn bus_frequency(clk_rate: Hertz, prescale: u8) -> Hertz {
    Hertz::from_raw(clk_rate.to_Hz() / (prescale as u32 + 1))
}
