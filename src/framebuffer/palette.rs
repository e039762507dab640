//! CDG Color Table
//!
//! Sixteen palette entries loaded eight at a time by the color table
//! instructions. Colors are 12-bit (4 bits per channel) in the stream and
//! expanded to 8 bits per channel here.

/// Number of palette entries.
pub const PALETTE_SIZE: usize = 16;

/// Entries carried by one color table load.
pub const BANK_SIZE: usize = 8;

/// 8-bit-per-channel RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Black, used for entries that were never loaded
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Create a color from 8-bit channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Create a color from 4-bit channels (0-15), scaling each to 0-255
    pub fn from_4bit(r: u8, g: u8, b: u8) -> Self {
        Rgb {
            r: (r & 0x0F) * 17,
            g: (g & 0x0F) * 17,
            b: (b & 0x0F) * 17,
        }
    }

    /// Decode a color table entry.
    ///
    /// The two 6-bit subcode bytes hold `--RRRRGG` and `--GGBBBB`.
    pub fn from_subcode_pair(high: u8, low: u8) -> Self {
        let r = (high >> 2) & 0x0F;
        let g = ((high & 0x03) << 2) | ((low >> 4) & 0x03);
        let b = low & 0x0F;
        Self::from_4bit(r, g, b)
    }

    /// Channels as an array, in RGB order
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Which half of the palette a color table load targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteBank {
    /// Entries 0-7
    Low,
    /// Entries 8-15
    High,
}

impl PaletteBank {
    /// Index of the first palette entry in this bank
    pub fn base_index(self) -> usize {
        match self {
            PaletteBank::Low => 0,
            PaletteBank::High => BANK_SIZE,
        }
    }
}

/// The 16-entry color table plus the transparent index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    entries: [Option<Rgb>; PALETTE_SIZE],
    transparent: Option<u8>,
}

impl Palette {
    /// Create a palette with every entry undefined
    pub fn new() -> Self {
        Self::default()
    }

    /// Load eight entries into one bank.
    ///
    /// Returns true if any entry changed.
    pub fn load_bank(&mut self, bank: PaletteBank, colors: &[Rgb; BANK_SIZE]) -> bool {
        let base = bank.base_index();
        let mut changed = false;
        for (slot, color) in self.entries[base..base + BANK_SIZE].iter_mut().zip(colors) {
            if *slot != Some(*color) {
                *slot = Some(*color);
                changed = true;
            }
        }
        changed
    }

    /// Entry as loaded, or `None` if never loaded
    pub fn entry(&self, index: u8) -> Option<Rgb> {
        self.entries
            .get(index as usize & (PALETTE_SIZE - 1))
            .copied()
            .flatten()
    }

    /// Color to display for an index (undefined entries render black)
    #[inline]
    pub fn color(&self, index: u8) -> Rgb {
        self.entry(index).unwrap_or(Rgb::BLACK)
    }

    /// Mark an entry as transparent. Returns true if this changed anything.
    pub fn set_transparent(&mut self, index: u8) -> bool {
        let index = index & 0x0F;
        let changed = self.transparent != Some(index);
        self.transparent = Some(index);
        changed
    }

    /// Currently transparent entry, if one was defined
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent
    }

    /// Check whether an index is the transparent one
    #[inline]
    pub fn is_transparent(&self, index: u8) -> bool {
        self.transparent == Some(index & 0x0F)
    }

    /// Forget every loaded entry and the transparent index
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcode_color_decoding() {
        // R=0xF, G=0x0, B=0x0
        assert_eq!(Rgb::from_subcode_pair(0b11_1100, 0b00_0000), Rgb::new(255, 0, 0));
        // R=0x0, G=0xF, B=0x0 (green split across both bytes)
        assert_eq!(Rgb::from_subcode_pair(0b00_0011, 0b11_0000), Rgb::new(0, 255, 0));
        // R=0x0, G=0x0, B=0xF
        assert_eq!(Rgb::from_subcode_pair(0b00_0000, 0b00_1111), Rgb::new(0, 0, 255));
        // R=0x1, G=0x2, B=0x3
        assert_eq!(Rgb::from_subcode_pair(0b00_0100, 0b10_0011), Rgb::new(17, 34, 51));
    }

    #[test]
    fn test_undefined_entries_render_black() {
        let palette = Palette::new();
        assert_eq!(palette.entry(5), None);
        assert_eq!(palette.color(5), Rgb::BLACK);
    }

    #[test]
    fn test_load_high_bank() {
        let mut palette = Palette::new();
        let colors: [Rgb; 8] = std::array::from_fn(|i| Rgb::from_4bit(i as u8, 0, 15));
        assert!(palette.load_bank(PaletteBank::High, &colors));
        assert_eq!(palette.entry(0), None);
        assert_eq!(palette.color(12), colors[4]);

        // Reloading identical colors is not a change
        assert!(!palette.load_bank(PaletteBank::High, &colors));
    }

    #[test]
    fn test_transparent_index() {
        let mut palette = Palette::new();
        assert!(palette.set_transparent(3));
        assert!(!palette.set_transparent(3));
        assert!(palette.is_transparent(3));
        assert!(!palette.is_transparent(4));
        palette.reset();
        assert_eq!(palette.transparent_index(), None);
    }
}
