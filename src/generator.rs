//! Arena instruction generator
//!
//! Turns one [`Arena`] into the ordered instructions that paint it. The
//! controller applies instructions in receipt order and the last write to an
//! address wins, so emission runs in four phases, each able to override the
//! previous ones:
//!
//! 1. baseline: every block in the arena's default color
//! 2. edge overrides, with their nested block and LED overrides
//! 3. block overrides, with their nested LED overrides
//! 4. LED overrides
//!
//! Generation is pure. A failing override is logged, recorded in
//! [`Snapshot::skipped`] and left out; everything else is still emitted. An
//! arena that fails [`Arena::validate`] yields an empty snapshot. Index ranges
//! may not be longer than the scope they address.

use tracing::{debug, info, warn};

use crate::address::{locate_led, relative_to_absolute, resolve_index};
use crate::arena::{Arena, BlockOverride, EdgeOverride, LedOverride};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::instruction::Instruction;

/// Instructions for one arena, ready for transmission.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub instructions: Vec<Instruction>,
    /// Overrides (or single indices) that were left out, and why
    pub skipped: Vec<Error>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Serialized instructions, in send order.
    pub fn wire(&self) -> Vec<String> {
        self.instructions.iter().map(Instruction::to_wire).collect()
    }
}

/// Generate the instructions for `arena`.
pub fn generate(arena: &Arena) -> Snapshot {
    info!(
        edges = arena.edges,
        blocks = arena.blocks,
        leds = arena.leds,
        color = %arena.color,
        "Generating arena snapshot"
    );
    let mut generator = Generator::new(arena);
    if let Err(e) = arena.validate() {
        generator.check(Err(e));
        return generator.snapshot;
    }
    generator.baseline();
    for edge in &arena.edge {
        let result = generator.edge(edge);
        generator.check(result);
    }
    for block in &arena.block {
        let result = generator.block(block);
        generator.check(result);
    }
    for led in &arena.led {
        let result = generator.led(led);
        generator.check(result);
    }
    generator.snapshot
}

/// Iteration order over the indices of a multi-index override.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
    Forward,
    /// Last index first, so the first listed index is written last and wins
    Reverse,
}

/// Indices of an expanded spec in emission order, each flagged with whether
/// it carries the override's nested overrides.
///
/// Only the first listed index carries them. Zeros inside a multi-index spec
/// are dropped.
fn targets(indices: &[i64], order: Order) -> Vec<(i64, bool)> {
    if let [index] = *indices {
        return vec![(index, true)];
    }
    let mut out: Vec<(i64, bool)> = indices
        .iter()
        .enumerate()
        .filter(|&(_, &index)| index != 0)
        .map(|(pos, &index)| (index, pos == 0))
        .collect();
    if order == Order::Reverse {
        out.reverse();
    }
    out
}

struct Generator<'a> {
    arena: &'a Arena,
    edges: i64,
    blocks_per_edge: i64,
    leds_per_block: i64,
    block_count: i64,
    led_count: i64,
    snapshot: Snapshot,
}

impl<'a> Generator<'a> {
    fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            edges: i64::from(arena.edges),
            blocks_per_edge: i64::from(arena.blocks),
            leds_per_block: i64::from(arena.leds),
            block_count: arena.block_count(),
            led_count: arena.led_count(),
            snapshot: Snapshot::default(),
        }
    }

    fn check(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "Skipping override");
            self.snapshot.skipped.push(e);
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.snapshot.instructions.push(instruction);
    }

    fn block_instruction(&self, address: i64, color: Color) -> Instruction {
        Instruction::block(address, self.leds_per_block, self.arena.brightness, color)
    }

    fn baseline(&mut self) {
        let color = match Color::parse(&self.arena.color) {
            Ok(color) => color,
            Err(e) => return self.check(Err(e)),
        };
        for address in 0..self.block_count {
            let instruction = self.block_instruction(address, color);
            self.emit(instruction);
        }
    }

    fn edge(&mut self, edge: &EdgeOverride) -> Result<()> {
        let color = Color::parse(&edge.color)?;
        let mut indices = edge.index.expand_within(self.edges.unsigned_abs())?;
        if indices.len() > 1 {
            // Listed edges wrap around the ring: `E + 1` is edge 1, `0` is edge `E`.
            for index in &mut indices {
                *index = relative_to_absolute(*index, self.edges, *index, self.edges);
            }
        }
        for (index, nested) in targets(&indices, Order::Reverse) {
            let edge_index = match resolve_index(self.edges, index) {
                Ok(edge_index) => edge_index,
                Err(e) => {
                    self.check(Err(e));
                    continue;
                }
            };
            debug!(edge = edge_index, %color, "Edge override");
            self.paint_edge(edge_index, color);
            if nested {
                self.edge_nested(edge_index, edge);
            }
        }
        Ok(())
    }

    fn paint_edge(&mut self, edge_index: i64, color: Color) {
        for local in 1..=self.blocks_per_edge {
            let address = if self.blocks_per_edge == 1 {
                edge_index - 1
            } else {
                relative_to_absolute(edge_index, self.blocks_per_edge, local, self.block_count) - 1
            };
            let instruction = self.block_instruction(address, color);
            self.emit(instruction);
        }
    }

    /// Block and LED overrides expressed relative to edge `edge_index`.
    fn edge_nested(&mut self, edge_index: i64, edge: &EdgeOverride) {
        for block in &edge.block {
            let result = self.edge_block(edge_index, block);
            self.check(result);
        }
        for led in &edge.led {
            let result = self.edge_led(edge_index, led);
            self.check(result);
        }
    }

    fn edge_block(&mut self, edge_index: i64, block: &BlockOverride) -> Result<()> {
        let color = Color::parse(&block.color)?;
        let absolute: Vec<i64> = block
            .index
            .expand_within(self.block_count.unsigned_abs())?
            .into_iter()
            .map(|local| relative_to_absolute(edge_index, self.blocks_per_edge, local, self.block_count))
            .collect();
        self.blocks(&absolute, color, &block.led);
        Ok(())
    }

    fn edge_led(&mut self, edge_index: i64, led: &LedOverride) -> Result<()> {
        let color = Color::parse(&led.color)?;
        let leds_per_edge = self.blocks_per_edge * self.leds_per_block;
        let absolute: Vec<i64> = led
            .index
            .expand_within(self.led_count.unsigned_abs())?
            .into_iter()
            .map(|local| relative_to_absolute(edge_index, leds_per_edge, local, self.led_count))
            .collect();
        self.leds(&absolute, color);
        Ok(())
    }

    fn block(&mut self, block: &BlockOverride) -> Result<()> {
        let color = Color::parse(&block.color)?;
        let indices = block.index.expand_within(self.block_count.unsigned_abs())?;
        self.blocks(&indices, color, &block.led);
        Ok(())
    }

    fn blocks(&mut self, indices: &[i64], color: Color, leds: &[LedOverride]) {
        for (index, nested) in targets(indices, Order::Reverse) {
            match resolve_index(self.block_count, index) {
                Ok(block_index) => self.paint_block(block_index, color, if nested { leds } else { &[] }),
                Err(e) => self.check(Err(e)),
            }
        }
    }

    /// One instruction for the block and its in-range LEDs, then one
    /// single-LED instruction per LED that spilled outside the block.
    fn paint_block(&mut self, block_index: i64, color: Color, leds: &[LedOverride]) {
        debug!(block = block_index, %color, "Block override");
        let mut instruction = self.block_instruction(block_index - 1, color);
        let mut spilled = Vec::new();
        for led in leds {
            let result = self.block_leds(block_index, led, &mut instruction, &mut spilled);
            self.check(result);
        }
        self.emit(instruction);
        for (led_index, color) in spilled {
            self.paint_led(led_index, color);
        }
    }

    fn block_leds(
        &self,
        block_index: i64,
        led: &LedOverride,
        instruction: &mut Instruction,
        spilled: &mut Vec<(i64, Color)>,
    ) -> Result<()> {
        let color = Color::parse(&led.color)?;
        let indices = led.index.expand_within(self.led_count.unsigned_abs())?;
        let multi = indices.len() > 1;
        for local in indices {
            if multi && local == 0 {
                continue;
            }
            if (1..=self.leds_per_block).contains(&local) {
                instruction.push_led(local - 1, color);
            } else {
                let led_index = relative_to_absolute(block_index, self.leds_per_block, local, self.led_count);
                debug!(block = block_index, local, led = led_index, "LED spills out of block");
                spilled.push((led_index, color));
            }
        }
        Ok(())
    }

    fn led(&mut self, led: &LedOverride) -> Result<()> {
        let color = Color::parse(&led.color)?;
        let indices = led.index.expand_within(self.led_count.unsigned_abs())?;
        self.leds(&indices, color);
        Ok(())
    }

    fn leds(&mut self, indices: &[i64], color: Color) {
        for (index, _) in targets(indices, Order::Forward) {
            self.paint_led(index, color);
        }
    }

    /// Repaint a single LED, leaving the rest of its block untouched.
    fn paint_led(&mut self, led_index: i64, color: Color) {
        match resolve_index(self.led_count, led_index) {
            Ok(led_index) => {
                let (address, slot) = locate_led(self.leds_per_block, led_index);
                debug!(led = led_index, block = address, slot, %color, "LED override");
                let instruction = Instruction::leds_only(address, self.leds_per_block, self.arena.brightness)
                    .with_led(slot, color);
                self.emit(instruction);
            }
            Err(e) => self.check(Err(e)),
        }
    }
}
