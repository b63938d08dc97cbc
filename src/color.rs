//! Fill colour of region patches

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RGBA color type
pub type Rgba = [f32; 4];

/// 24-bit RGB fill colour as configured, e.g. `0x2194ce`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FillColor(u32);

impl FillColor {
    pub const WHITE: FillColor = FillColor(0xFF_FF_FF);

    /// Wrap a `0xRRGGBB` value; `None` above `0xFFFFFF`
    pub const fn from_rgb(rgb: u32) -> Option<Self> {
        if rgb <= 0xFF_FF_FF {
            Some(Self(rgb))
        } else {
            None
        }
    }

    /// Parse `"0xRRGGBB"`, `"#RRGGBB"` or bare `"RRGGBB"`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .or_else(|| s.strip_prefix('#'))
            .unwrap_or(s);
        if hex.is_empty() || hex.len() > 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().and_then(Self::from_rgb)
    }

    /// Read a colour from a JSON string or integer
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .and_then(Self::from_rgb),
            _ => None,
        }
    }

    #[inline]
    pub fn rgb(self) -> u32 {
        self.0
    }

    /// Opaque RGBA with channels in `[0, 1]`
    pub fn to_rgba(self) -> Rgba {
        let channel = |shift: u32| ((self.0 >> shift) & 0xFF) as f32 / 255.0;
        [channel(16), channel(8), channel(0), 1.0]
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}
