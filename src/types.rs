//! Shared boundary types for the celebration engine.
//!
//! This module defines the contracts between the layers:
//! - Engine → Renderer: the engine mutates a `Stage`; the renderer reads it
//!   against a `Viewport` and produces cell grids.
//! - Player → Engine: input is reduced to a small `Tap` vocabulary.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared style primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<Color>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dim: bool,
}

impl Style {
    pub fn fg(color: Color) -> Self {
        Style {
            fg: Some(color),
            ..Style::default()
        }
    }

    pub fn is_default(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && !self.bold && !self.dim
    }
}

// ---------------------------------------------------------------------------
// Renderer output (in-memory, repainted live)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

// ---------------------------------------------------------------------------
// Stage space
// ---------------------------------------------------------------------------

/// The stage coordinate space, in terminal cells. x grows right, y grows
/// down. Positions are `f64` so tweens can move smoothly between cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Viewport {
            width: width as f64,
            height: height as f64,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.height / 2.0
    }
}

// ---------------------------------------------------------------------------
// Player → Engine input
// ---------------------------------------------------------------------------

/// The three pointer gestures the experience understands. The player maps
/// raw mouse/key events to whichever of these the active scene accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    /// Tap on the gift widget.
    Gift,
    /// Tap on the cake widget.
    Cake,
    /// Tap on a scene's advance affordance (speech bubble, message, replay).
    Advance,
}
