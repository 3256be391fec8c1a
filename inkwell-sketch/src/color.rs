use crate::error::SketchError;
use image::Rgba;
use std::fmt;
use std::str::FromStr;

/// Opaque stroke color, written as `#rgb` or `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl StrokeColor {
    pub const DEFAULT: StrokeColor = StrokeColor {
        r: 0xff,
        g: 0x3b,
        b: 0x30,
    };

    pub fn rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 0xff])
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for StrokeColor {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SketchError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..=i].repeat(2));
                Ok(StrokeColor {
                    r: expand(0)?,
                    g: expand(1)?,
                    b: expand(2)?,
                })
            }
            6 => Ok(StrokeColor {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!("#ff3b30".parse::<StrokeColor>().unwrap(), StrokeColor::DEFAULT);
        assert_eq!(
            "#0af".parse::<StrokeColor>().unwrap(),
            StrokeColor { r: 0x00, g: 0xaa, b: 0xff }
        );
        assert_eq!("#FFFFFF".parse::<StrokeColor>().unwrap().to_string(), "#ffffff");
    }

    #[test]
    fn rejects_other_notations() {
        for bad in ["ff3b30", "#ff3b3", "#ff3b30aa", "red", "#ggg", "", "#"] {
            assert!(bad.parse::<StrokeColor>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn default_is_red() {
        assert_eq!(StrokeColor::default().to_string(), "#ff3b30");
        assert_eq!(StrokeColor::default().rgba(), Rgba([0xff, 0x3b, 0x30, 0xff]));
    }
}
