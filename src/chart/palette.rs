use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidColorError(String),
}

/// An opaque sRGB color, written as `#RRGGBB`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// Mixes the color with white as if drawn with the given opacity on a white page.
    pub fn over_white(self, alpha: f64) -> Color {
        let alpha = alpha.clamp(0.0, 1.0);
        let blend = |channel: u8| (alpha * channel as f64 + (1.0 - alpha) * 255.0).round() as u8;
        Color::rgb(blend(self.r), blend(self.g), blend(self.b))
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (self.r as f64 / 255.0, self.g as f64 / 255.0, self.b as f64 / 255.0)
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let error = || ColorError::InvalidColorError(value.to_owned());
        let hex = value.strip_prefix('#').ok_or_else(error)?;
        if hex.len() != 6 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(error());
        }
        let channel = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).map_err(|_| error());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

const BLUE_GREY: [Color; 3] = [Color::rgb(0x00, 0x20, 0x60), Color::rgb(0x00, 0x50, 0xB3), Color::rgb(0x7F, 0x7F, 0x7F)];
const GREEN_TURQUOISE: [Color; 3] = [Color::rgb(0x00, 0x64, 0x00), Color::rgb(0x00, 0x99, 0x99), Color::rgb(0xA6, 0xA6, 0xA6)];
const PURPLE_BERRY: [Color; 3] = [Color::rgb(0x4B, 0x00, 0x4B), Color::rgb(0x73, 0x26, 0x73), Color::rgb(0xB3, 0x80, 0xB3)];
const ORANGE_GREY: [Color; 3] = [Color::rgb(0xE4, 0x6C, 0x0A), Color::rgb(0xF4, 0xB1, 0x83), Color::rgb(0x7F, 0x7F, 0x7F)];

/// The fixed set of color palettes; exactly one is active per run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    /// Blue/Grey, the standard palette
    #[default]
    BlueGrey,
    /// Green/Turquoise
    GreenTurquoise,
    /// Purple/Berry
    PurpleBerry,
    /// Orange/Grey
    OrangeGrey,
}

impl Palette {
    pub fn colors(&self) -> &'static [Color] {
        match self {
            Palette::BlueGrey => &BLUE_GREY,
            Palette::GreenTurquoise => &GREEN_TURQUOISE,
            Palette::PurpleBerry => &PURPLE_BERRY,
            Palette::OrangeGrey => &ORANGE_GREY,
        }
    }

    /// Color of the bar at `index`, cycling through the palette.
    pub fn color(&self, index: usize) -> Color {
        let colors = self.colors();
        colors[index % colors.len()]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Palette::BlueGrey => "Blue/Grey (standard)",
            Palette::GreenTurquoise => "Green/Turquoise",
            Palette::PurpleBerry => "Purple/Berry",
            Palette::OrangeGrey => "Orange/Grey",
        }
    }

    /// All palettes in selection order.
    pub fn all() -> &'static [Palette] {
        Palette::value_variants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_hex_colors() {
        assert_eq!("#0050b3".parse::<Color>().unwrap(), Color::rgb(0x00, 0x50, 0xB3));
        assert_eq!(Color::rgb(0xE4, 0x6C, 0x0A).to_string(), "#E46C0A");
        assert!("0050b3".parse::<Color>().is_err());
        assert!("#0050b".parse::<Color>().is_err());
        assert!("#00g0b3".parse::<Color>().is_err());
        assert!("#ééé".parse::<Color>().is_err());
        assert!("#+1+1+1".parse::<Color>().is_err());
        assert!("#-1-1-1".parse::<Color>().is_err());
    }

    #[test]
    fn blends_grey_against_white() {
        assert_eq!(Color::rgb(0x80, 0x80, 0x80).over_white(0.8), Color::rgb(0x99, 0x99, 0x99));
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).over_white(1.0), Color::rgb(0x12, 0x34, 0x56));
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).over_white(0.0), Color::rgb(0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn palettes_cycle_their_colors() {
        let palette = Palette::BlueGrey;
        assert_eq!(palette.color(0).to_string(), "#002060");
        assert_eq!(palette.color(1).to_string(), "#0050B3");
        assert_eq!(palette.color(2).to_string(), "#7F7F7F");
        assert_eq!(palette.color(3), palette.color(0));
        assert_eq!(Palette::default(), Palette::BlueGrey);
    }

    #[test]
    fn lists_every_palette() {
        let names: Vec<&str> = Palette::all().iter().map(Palette::display_name).collect();
        assert_eq!(names, vec!["Blue/Grey (standard)", "Green/Turquoise", "Purple/Berry", "Orange/Grey"]);
        assert_eq!(Palette::OrangeGrey.colors()[1].to_string(), "#F4B183");
        assert_eq!(Palette::PurpleBerry.colors()[0].to_string(), "#4B004B");
        assert_eq!(Palette::GreenTurquoise.colors()[2].to_string(), "#A6A6A6");
    }

    #[test]
    fn colors_serialize_as_hex_strings() {
        let json = serde_json::to_string(&Color::rgb(0xE0, 0xE0, 0xE0)).unwrap();
        assert_eq!(json, "\"#E0E0E0\"");
        let color: Color = serde_json::from_str("\"#999999\"").unwrap();
        assert_eq!(color, Color::rgb(0x99, 0x99, 0x99));
        assert!(serde_json::from_str::<Color>("\"grey\"").is_err());
    }
}
