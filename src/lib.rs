//! ascii-celebration — a terminal-native animated greeting.
//!
//! A six-scene scripted experience: a gift unwraps, a friend arrives with a
//! bouquet, a cake is carried in, the cake is cut slice by slice under
//! confetti, a personalized message appears, and a confetti finale plays.
//!
//! The crate is split the same way on every axis:
//! - `engine` understands time, animation, and the scene state machine.
//!   It is headless and never touches the terminal.
//! - `renderer` is a pure rasterizer from the engine's stage to cell grids.
//! - `player` owns the terminal: raw mode, the frame clock, and input.

pub mod audio;
pub mod config;
pub mod engine;
pub mod player;
pub mod renderer;
pub mod types;
