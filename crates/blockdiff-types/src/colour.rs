use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An RGB colour in `#rrggbb` form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colour([u8; 3]);

impl Colour {
    /// Grey used for blocks that survived the diff untouched.
    pub const UNMODIFIED: Colour = Colour([0xd0, 0xd0, 0xd0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Deterministic palette colour for a block type, used when the block
    /// carries no explicit colour.
    pub fn for_type(block_type: &str) -> Self {
        let hash = blake3::hash(block_type.as_bytes());
        let hue = u16::from_le_bytes([hash.as_bytes()[0], hash.as_bytes()[1]]) % 360;
        Self::from_hsv(hue, 0.45, 0.65)
    }

    fn from_hsv(hue: u16, saturation: f64, value: f64) -> Self {
        let c = value * saturation;
        let h = f64::from(hue) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match hue / 60 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = value - c;
        let to_byte = |v: f64| ((v + m) * 255.0).round() as u8;
        Self([to_byte(r), to_byte(g), to_byte(b)])
    }

    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Colour({})", self.to_hex())
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Colour {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| TypeError::InvalidColour(s.into()))?;
        let bytes = hex::decode(digits).map_err(|_| TypeError::InvalidColour(s.into()))?;
        let rgb: [u8; 3] = bytes
            .try_into()
            .map_err(|_| TypeError::InvalidColour(s.into()))?;
        Ok(Self(rgb))
    }
}

impl TryFrom<String> for Colour {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        colour.to_hex()
    }
}
