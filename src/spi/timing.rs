//! Controller timing limits

use embassy_time::Duration;
use fugit::HertzU32 as Hertz;

/// Slowest bus clock the controller supports
pub const MIN_FREQUENCY: Hertz = Hertz::from_raw(600_000);
/// Fastest bus clock the controller supports
pub const MAX_FREQUENCY: Hertz = Hertz::from_raw(50_000_000);

/// Upper bound of a single transfer, used when suspending.
pub const MAX_TRANSFER_TIME: Duration = Duration::from_millis(5000);

/// Module reset pulse width (GCR0 held low)
pub const RESET_DELAY_US: u32 = 100;
