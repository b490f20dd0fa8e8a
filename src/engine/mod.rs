//! Engine — the headless animation core.
//!
//! The engine understands time, tweens, particles, and the scene state
//! machine. It mutates a `Stage` that the renderer reads; it never deals
//! with terminals, ANSI codes, or grids.

pub mod particles;
pub mod scenes;
pub mod stage;
pub mod tween;
pub mod widgets;
