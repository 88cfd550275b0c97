//! Color representation

/// A color as it appears in style and run properties
///
/// Theme tints are compared by bit pattern, so build them with
/// [`Color::theme`] to keep `-0.0` and NaN out.
#[derive(Debug, Clone, Copy, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// ARGB color
    Argb { a: u8, r: u8, g: u8, b: u8 },

    /// Theme color with a tint in -1.0..=1.0, negative darkens
    Theme { index: u8, tint: f64 },

    /// Indexed color (legacy palette)
    Indexed(u8),
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    /// Opaque RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Argb { a: 255, r, g, b }
    }

    /// Theme color, with the tint clamped to -1.0..=1.0
    pub fn theme(index: u8, tint: f64) -> Self {
        let tint = if tint.is_nan() || tint == 0.0 {
            0.0
        } else {
            tint.clamp(-1.0, 1.0)
        };
        Color::Theme { index, tint }
    }

    /// Parse "RRGGBB" or "AARRGGBB", with or without a leading '#'
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::Argb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// ARGB hex as used in the `rgb` attribute, or `None` for non-RGB colors
    pub fn to_argb_hex(&self) -> Option<String> {
        match self {
            Color::Argb { a, r, g, b } => Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b)),
            Color::Auto | Color::Theme { .. } | Color::Indexed(_) => None,
        }
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Color::Auto, Color::Auto) => true,
            (
                Color::Argb { a, r, g, b },
                Color::Argb {
                    a: a2,
                    r: r2,
                    g: g2,
                    b: b2,
                },
            ) => (a, r, g, b) == (a2, r2, g2, b2),
            (Color::Theme { index, tint }, Color::Theme { index: i2, tint: t2 }) => {
                index == i2 && tint.to_bits() == t2.to_bits()
            }
            (Color::Indexed(i), Color::Indexed(i2)) => i == i2,
            _ => false,
        }
    }
}

impl Eq for Color {}

impl std::hash::Hash for Color {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Color::Auto => {}
            Color::Argb { a, r, g, b } => (a, r, g, b).hash(state),
            Color::Theme { index, tint } => {
                index.hash(state);
                tint.to_bits().hash(state);
            }
            Color::Indexed(i) => i.hash(state),
        }
    }
}
