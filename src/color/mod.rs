//! Named color table
//!
//! Maps the symbolic names accepted by the command language to RGB triples.
//! `OMIT` is not a color: it tells the controller to keep the block color it
//! already has and only apply the LED entries of an instruction.

use core::fmt;

use smart_leds::RGB8;

use crate::error::{Error, Result};

pub type Rgb = RGB8;

/// Wire text for [`Color::Omit`].
const OMIT_TRIPLE: &str = "-1,-1,-1";

/// Declares the table once: variant, wire name and RGB value.
macro_rules! color_table {
    ($($variant:ident => $name:literal, ($r:literal, $g:literal, $b:literal);)*) => {
        /// Known colors, plus the [`Color::Omit`] sentinel.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Color {
            $($variant,)*
            /// Leave the block color unchanged.
            Omit,
        }

        impl Color {
            /// Every entry of the table, sentinel last.
            pub const ALL: &'static [Color] = &[$(Color::$variant,)* Color::Omit];

            /// Canonical (upper case) name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                    Self::Omit => "OMIT",
                }
            }

            /// RGB value, `None` for the sentinel.
            pub const fn rgb(self) -> Option<Rgb> {
                match self {
                    $(Self::$variant => Some(Rgb { r: $r, g: $g, b: $b }),)*
                    Self::Omit => None,
                }
            }

            fn from_upper(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    "OMIT" => Some(Self::Omit),
                    _ => None,
                }
            }
        }
    };
}

color_table! {
    Black => "NONE", (0, 0, 0);
    Red => "RED", (255, 0, 0);
    Green => "GREEN", (0, 255, 0);
    Blue => "BLUE", (0, 0, 255);
    Yellow => "YELLOW", (255, 255, 0);
    Magenta => "MAGENTA", (255, 0, 255);
    Cyan => "CYAN", (0, 255, 255);
    White => "WHITE", (255, 255, 255);
    LowRed => "LR", (17, 0, 7);
    LowGreen => "LG", (7, 12, 0);
    LowBlue => "LB", (10, 0, 12);
    LowYellow => "LY", (200, 120, 0);
    LowCyan => "LC", (0, 200, 50);
    LowMagenta => "LM", (150, 0, 60);
    ExperimentRed => "EXPR", (242, 94, 139);
    ExperimentGreen => "EXPG", (100, 227, 121);
    ExperimentBlue => "EXPB", (77, 107, 227);
    ExperimentYellow => "EXPY", (204, 139, 82);
    ExperimentCyan => "EXPC", (65, 183, 196);
    ExperimentMagenta => "EXPM", (196, 73, 227);
    Zombie => "ZOMBIE", (27, 165, 44);
    Pump => "PUMP", (241, 88, 2);
    Purple => "PURPLE", (124, 16, 173);
}

impl Color {
    /// Look a color up by name, ignoring case.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_upper(&name.trim().to_ascii_uppercase())
            .ok_or_else(|| Error::UnknownColor(name.to_owned()))
    }

    /// `R,G,B` as sent to the controller.
    pub fn triple(self) -> Triple {
        Triple(self)
    }
}

/// Display adapter rendering a color as its wire triple.
#[derive(Debug, Clone, Copy)]
pub struct Triple(Color);

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.rgb() {
            Some(rgb) => write!(f, "{},{},{}", rgb.r, rgb.g, rgb.b),
            None => f.write_str(OMIT_TRIPLE),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
