//! Wire instructions
//!
//! One instruction repaints one block. The controller parses the fields
//! positionally, so key order and text layout are fixed:
//!
//! ```text
//! {
//!     "block": "<blockIndex>,<ledsPerBlock>,<R>,<G>,<B>",
//!     "brightness": <int>,
//!     "led": ["<ledLocalIndex>,<R>,<G>,<B>", ...]
//! }
//! ```

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::color::Color;

const WIRE_INDENT: &[u8] = b"    ";

/// A single block instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    /// Address descriptor: `index,ledCount,R,G,B`
    pub block: String,
    pub brightness: u8,
    /// LED entries: `ledIndex,R,G,B`
    pub led: Vec<String>,
}

impl Instruction {
    /// Paint block `address` (0-based) with `color`.
    pub fn block(address: i64, leds_per_block: i64, brightness: u8, color: Color) -> Self {
        Self {
            block: format!("{address},{leds_per_block},{}", color.triple()),
            brightness,
            led: Vec::new(),
        }
    }

    /// Address a block without repainting it, for LED-only updates.
    pub fn leds_only(address: i64, leds_per_block: i64, brightness: u8) -> Self {
        Self::block(address, leds_per_block, brightness, Color::Omit)
    }

    /// Add an LED entry at `slot` (0-based within the block).
    #[must_use]
    pub fn with_led(mut self, slot: i64, color: Color) -> Self {
        self.push_led(slot, color);
        self
    }

    pub fn push_led(&mut self, slot: i64, color: Color) {
        self.led.push(format!("{slot},{}", color.triple()));
    }

    /// Block address parsed back from the descriptor.
    pub fn address(&self) -> Option<i64> {
        self.block.split(',').next()?.parse().ok()
    }

    /// Serialized text handed to the device session.
    pub fn to_wire(&self) -> String {
        let mut buf = Vec::with_capacity(96 + self.led.len() * 24);
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(WIRE_INDENT));
        // Strings and integers only; serializing into a Vec cannot fail.
        if self.serialize(&mut ser).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
