//! PK8000 memory banks and I/O port registers.
//!
//! Four 64 KiB banks sit behind the CPU address space: RAM, the BIOS ROM and
//! two expansion banks. Each 16 KiB quadrant of the address space reads from
//! the bank selected by a 2-bit field of port 0x80. Writes always land in
//! RAM, so code can write under ROM.

use emu_core::Subsystem;

use crate::error::ConfigError;

/// Size of every bank.
pub const BANK_SIZE: usize = 0x1_0000;

/// The four memory banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    Ram,
    Rom,
    X1,
    X2,
}

impl BankKind {
    /// Bank selected for reads by a 2-bit field of port 0x80.
    #[must_use]
    pub const fn from_selector(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Rom,
            1 => Self::X1,
            2 => Self::X2,
            _ => Self::Ram,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Rom => "rom",
            Self::X1 => "x1",
            Self::X2 => "x2",
        }
    }
}

/// Backing storage for the four banks.
pub struct MemBanks {
    pub ram: Box<[u8]>,
    pub rom: Box<[u8]>,
    pub x1: Box<[u8]>,
    pub x2: Box<[u8]>,
}

impl MemBanks {
    fn new() -> Self {
        let bank = || vec![0; BANK_SIZE].into_boxed_slice();
        Self {
            ram: bank(),
            rom: bank(),
            x1: bank(),
            x2: bank(),
        }
    }

    #[must_use]
    pub fn bank(&self, kind: BankKind) -> &[u8] {
        match kind {
            BankKind::Ram => &self.ram,
            BankKind::Rom => &self.rom,
            BankKind::X1 => &self.x1,
            BankKind::X2 => &self.x2,
        }
    }

    pub fn bank_mut(&mut self, kind: BankKind) -> &mut [u8] {
        match kind {
            BankKind::Ram => &mut self.ram,
            BankKind::Rom => &mut self.rom,
            BankKind::X1 => &mut self.x1,
            BankKind::X2 => &mut self.x2,
        }
    }
}

/// Latched values of the system ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPorts {
    /// Bank control: bits 2i..2i+1 select the read bank of quadrant i.
    pub port80: u8,
    /// Keyboard matrix rows, active low.
    pub port81: [u8; 16],
    /// Keyboard row select (low nibble), sound and tape bits.
    pub port82: u8,
    /// Video mode. Bit 5 selects the RAM timing mode.
    pub port84: u8,
    pub port85: u8,
    pub port86: u8,
    /// Foreground and background colours.
    pub port88: u8,
    /// Joystick lines.
    pub port8c: u8,
    pub port8d: u8,
    /// Screen base addresses.
    pub port90: u8,
    pub port91: u8,
    pub port92: u8,
    pub port93: u8,
}

impl Default for IoPorts {
    fn default() -> Self {
        Self {
            port80: 0xFC,
            port81: [0xFF; 16],
            port82: 0x00,
            port84: 0x2F,
            port85: 0x00,
            port86: 0xCE,
            port88: 0x00,
            port8c: 0x00,
            port8d: 0x00,
            port90: 0xF0,
            port91: 0xF0,
            port92: 0xF7,
            port93: 0xF7,
        }
    }
}

/// A BIOS image that fits the ROM bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomImage(Box<[u8]>);

impl RomImage {
    pub fn new(bytes: Vec<u8>) -> Result<Self, ConfigError> {
        if bytes.len() > BANK_SIZE {
            return Err(ConfigError::RomTooLarge { len: bytes.len() });
        }
        Ok(Self(bytes.into_boxed_slice()))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Banks plus port registers.
pub struct Memory {
    pub banks: MemBanks,
    pub ports: IoPorts,
}

impl Memory {
    /// Memory in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        let mut memory = Self {
            banks: MemBanks::new(),
            ports: IoPorts::default(),
        };
        memory.init();
        memory
    }

    /// Copy a BIOS image to the start of the ROM bank.
    pub fn load_rom(&mut self, image: &RomImage) {
        self.banks.rom[..image.len()].copy_from_slice(image.as_bytes());
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for Memory {
    /// RAM is cleared; the other banks read as an empty bus.
    fn init(&mut self) {
        self.banks.ram.fill(0x00);
        self.banks.rom.fill(0xFF);
        self.banks.x1.fill(0xFF);
        self.banks.x2.fill(0xFF);
        self.reset();
    }

    /// Port registers return to their power-on values. Bank contents stay.
    fn reset(&mut self) {
        self.ports = IoPorts::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_fills_banks() {
        let memory = Memory::new();
        assert!(memory.banks.ram.iter().all(|&b| b == 0x00));
        assert!(memory.banks.rom.iter().all(|&b| b == 0xFF));
        assert!(memory.banks.x2.iter().all(|&b| b == 0xFF));
        assert_eq!(memory.ports.port80, 0xFC);
        assert_eq!(memory.ports.port84, 0x2F);
    }

    #[test]
    fn reset_keeps_bank_contents() {
        let mut memory = Memory::new();
        memory.banks.ram[0x1234] = 0x56;
        memory.ports.port80 = 0xFF;
        memory.reset();
        assert_eq!(memory.banks.ram[0x1234], 0x56);
        assert_eq!(memory.ports.port80, 0xFC);
    }

    #[test]
    fn rom_image_must_fit() {
        let mut memory = Memory::new();
        let image = RomImage::new(vec![0xC3, 0x00, 0x01]).expect("small image");
        memory.load_rom(&image);
        assert_eq!(&memory.banks.rom[..4], &[0xC3, 0x00, 0x01, 0xFF]);

        assert!(RomImage::new(vec![0; BANK_SIZE]).is_ok());
        let err = RomImage::new(vec![0; BANK_SIZE + 1]).unwrap_err();
        assert!(matches!(err, ConfigError::RomTooLarge { len } if len == BANK_SIZE + 1));
    }

    #[test]
    fn selector_maps_to_banks() {
        let kinds: Vec<_> = (0..4).map(BankKind::from_selector).collect();
        assert_eq!(kinds, [BankKind::Rom, BankKind::X1, BankKind::X2, BankKind::Ram]);
    }
}
