//! Interactive widgets — the gift box and the cake.
//!
//! Each widget owns its stage nodes, its small interaction state machine,
//! and its choreography. It reports completion through the animator's
//! completed-handle list; the scene controller turns that into scene
//! transitions. When rich rendering is unavailable the widget mounts a
//! full-surface static tap target instead of its glyph art, and the same
//! completion signal stays reachable.

mod cake;
mod gift;

pub use cake::Cake;
pub use gift::{GiftBox, GiftState};
