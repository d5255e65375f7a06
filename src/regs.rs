//! Register interface
//!
//! Offsets and field layouts of the SPI controller register window.

use core::ptr::NonNull;

use bitfield::bitfield;

/// Default level pattern of the chip-select lines (all inactive)
pub const CS_DEFAULT: u8 = 0xFF;

/// Number of SPIFMTn format registers
pub const FMT_COUNT: u8 = 4;

/// Registers of the controller window.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
    /// Global control 0, module reset
    Gcr0,
    /// Global control 1
    Gcr1,
    /// Interrupt enable
    Int,
    /// Interrupt level
    Lvl,
    /// Status flags
    Flg,
    /// Pin control 0, pin functions
    Pc0,
    /// Transmit data and format select
    Dat1,
    /// Receive buffer
    Buf,
    /// Chip-select timing
    Delay,
    /// Default chip-select levels
    Def,
    /// Data format, one per chip-select
    Fmt(u8),
}

impl Reg {
    pub const fn offset(self) -> usize {
        match self {
            Reg::Gcr0 => 0x00,
            Reg::Gcr1 => 0x04,
            Reg::Int => 0x08,
            Reg::Lvl => 0x0c,
            Reg::Flg => 0x10,
            Reg::Pc0 => 0x14,
            Reg::Dat1 => 0x3c,
            Reg::Buf => 0x40,
            Reg::Delay => 0x48,
            Reg::Def => 0x4c,
            Reg::Fmt(n) => 0x50 + 4 * n as usize,
        }
    }
}

// GCR1
pub const GCR1_MASTER: u32 = 1 << 0;
pub const GCR1_CLKMOD: u32 = 1 << 1;
pub const GCR1_LOOPBACK: u32 = 1 << 16;
pub const GCR1_SPIENA: u32 = 1 << 24;

// INT
pub const INT_DLEN_ERR: u32 = 1 << 0;
pub const INT_TIMEOUT: u32 = 1 << 1;
pub const INT_PARERR: u32 = 1 << 2;
pub const INT_DESYNC: u32 = 1 << 3;
pub const INT_BITERR: u32 = 1 << 4;
pub const INT_OVRRUN: u32 = 1 << 6;
pub const INT_RX: u32 = 1 << 8;
pub const INT_TX: u32 = 1 << 9;
pub const INT_DMA_REQ_EN: u32 = 1 << 16;
pub const INT_ENABLE_HIGHZ: u32 = 1 << 24;
pub const INT_MASKALL: u32 = 0x0101_035F;

// LVL
pub const LVL_ALL_INT1: u32 = 0x0000_01FF;
pub const LVL_ALL_INT0: u32 = 0x0000_0000;

// PC0
pub const PC0_SPIENA: u32 = 1 << 8;
pub const PC0_CLKFUN: u32 = 1 << 9;
pub const PC0_DOFUN: u32 = 1 << 10;
pub const PC0_DIFUN: u32 = 1 << 11;

// DAT1
pub const DAT1_CSNR_SHIFT: u32 = 16;
pub const DAT1_DFSEL_SHIFT: u32 = 24;
pub const DAT1_CSHOLD: u32 = 1 << 28;
/// Keeps data and format select, drops CSHOLD and the low CSNR bits
pub const DAT1_RELEASE_MASK: u32 = 0x0ffc_ffff;

// BUF
pub const BUF_TXFULL: u32 = 1 << 29;
pub const BUF_RXEMPTY: u32 = 1 << 31;

// DELAY
pub const DELAY_T2C_SHIFT: u32 = 16;
pub const DELAY_C2T_SHIFT: u32 = 24;

bitfield! {
    /// SPIFMTn
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Fmt(u32);
    impl Debug;
    u32;
    pub charlen, set_charlen : 4, 0;
    pub prescale, set_prescale : 15, 8;
    /// Set when data is captured on the first clock edge (CPHA = 0)
    pub phase, set_phase : 16;
    pub polarity, set_polarity : 17;
    pub distimer, set_distimer : 18;
    /// LSB first
    pub shiftdir, set_shiftdir : 20;
    pub waitena, set_waitena : 21;
    pub parityena, set_parityena : 22;
    pub odd_parity, set_odd_parity : 23;
    pub wdelay, set_wdelay : 29, 24;
}

bitfield! {
    /// SPIFLG
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Flags(u32);
    impl Debug;
    u32;
    pub dlen_err, _ : 0;
    pub timeout, _ : 1;
    pub parity_err, _ : 2;
    pub desync, _ : 3;
    pub bit_err, _ : 4;
    pub overrun, _ : 6;
    pub rx_intr, _ : 8;
    pub tx_intr, _ : 9;
    pub buf_init_active, _ : 24;
}

bitfield! {
    /// SPIDAT1
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Dat1(u32);
    impl Debug;
    u32;
    pub data, set_data : 15, 0;
    pub csnr, set_csnr : 23, 16;
    pub dfsel, set_dfsel : 25, 24;
    pub wdel, set_wdel : 26;
    pub cshold, set_cshold : 28;
}

/// Access to the controller register window.
///
/// Accessors take `&self`: the window is shared with the interrupt handler and
/// DMA completion callbacks, which only ever touch it between or around the
/// engine's own accesses.
pub trait Regs {
    fn read(&self, reg: Reg) -> u32;

    fn write(&self, reg: Reg, val: u32);

    /// Bus address of `reg` as seen by the DMA engine
    fn bus_addr(&self, reg: Reg) -> usize;

    #[inline]
    fn modify(&self, reg: Reg, f: impl FnOnce(u32) -> u32) {
        let v = self.read(reg);
        self.write(reg, f(v));
    }

    #[inline]
    fn set_bits(&self, reg: Reg, bits: u32) {
        self.modify(reg, |v| v | bits);
    }

    #[inline]
    fn clear_bits(&self, reg: Reg, bits: u32) {
        self.modify(reg, |v| v & !bits);
    }

    #[inline]
    fn set_or_clear(&self, reg: Reg, bits: u32, set: bool) {
        if set {
            self.set_bits(reg, bits)
        } else {
            self.clear_bits(reg, bits)
        }
    }

    #[inline]
    fn modify_fmt(&self, cs: u8, f: impl FnOnce(&mut Fmt)) {
        self.modify(Reg::Fmt(cs), |v| {
            let mut fmt = Fmt(v);
            f(&mut fmt);
            fmt.0
        });
    }

    #[inline]
    fn flags(&self) -> Flags {
        Flags(self.read(Reg::Flg))
    }
}

impl<T: Regs + ?Sized> Regs for &T {
    #[inline]
    fn read(&self, reg: Reg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&self, reg: Reg, val: u32) {
        (**self).write(reg, val)
    }

    #[inline]
    fn bus_addr(&self, reg: Reg) -> usize {
        (**self).bus_addr(reg)
    }
}

/// Memory-mapped register window.
#[derive(Clone, Copy)]
pub struct Mmio {
    base: NonNull<u32>,
    phys_base: usize,
}

// SAFETY: the window is device memory mapped for the lifetime of the driver;
// every access is a single volatile load or store.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

impl Mmio {
    /// Wrap a mapped register window.
    ///
    /// # Safety
    ///
    /// `base` must point to the controller's register window, mapped for device
    /// access and valid for as long as the returned value is used. `phys_base`
    /// is the address of the same window on the DMA engine's bus.
    pub const unsafe fn new(base: NonNull<u32>, phys_base: usize) -> Self {
        Self { base, phys_base }
    }

    #[inline]
    fn ptr(&self, reg: Reg) -> *mut u32 {
        // SAFETY: all offsets lie inside the controller window
        unsafe { self.base.as_ptr().byte_add(reg.offset()) }
    }
}

impl Regs for Mmio {
    #[inline]
    fn read(&self, reg: Reg) -> u32 {
        unsafe { self.ptr(reg).read_volatile() }
    }

    #[inline]
    fn write(&self, reg: Reg, val: u32) {
        unsafe { self.ptr(reg).write_volatile(val) }
    }

    #[inline]
    fn bus_addr(&self, reg: Reg) -> usize {
        self.phys_base + reg.offset()
    }
}
