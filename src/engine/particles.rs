//! Particle bursts — batches of short-lived confetti nodes.
//!
//! A burst spawns N particles under a container node, each with randomized
//! size, color, shape, and an outbound tween (displacement, spin, fade).
//! When a particle's tween completes the particle is removed from the
//! stage, so the container's child count returns to its pre-burst value.

use std::collections::HashMap;
use std::ops::Range;

use rand::Rng;

use crate::types::{Color, Style};

use super::stage::{Node, NodeId, Prop, Sprite, Stage};
use super::tween::{Animator, Easing, TweenConfig, TweenHandle};

const CONFETTI_PALETTE: [Color; 6] = [
    Color::Rgb { r: 0xff, g: 0x6b, b: 0x6b },
    Color::Rgb { r: 0x4e, g: 0xcd, b: 0xc4 },
    Color::Rgb { r: 0x45, g: 0xb7, b: 0xd1 },
    Color::Rgb { r: 0x96, g: 0xce, b: 0xb4 },
    Color::Rgb { r: 0xfe, g: 0xca, b: 0x57 },
    Color::Rgb { r: 0xff, g: 0x9f, b: 0xf3 },
];

const FINALE_PALETTE: [Color; 8] = [
    Color::Rgb { r: 0xff, g: 0x6b, b: 0x6b },
    Color::Rgb { r: 0x4e, g: 0xcd, b: 0xc4 },
    Color::Rgb { r: 0x45, g: 0xb7, b: 0xd1 },
    Color::Rgb { r: 0x96, g: 0xce, b: 0xb4 },
    Color::Rgb { r: 0xfe, g: 0xca, b: 0x57 },
    Color::Rgb { r: 0xff, g: 0x9f, b: 0xf3 },
    Color::Rgb { r: 0xa8, g: 0xe6, b: 0xcf },
    Color::Rgb { r: 0xff, g: 0xd9, b: 0x3d },
];

/// Where a burst's particles first appear, relative to the container.
#[derive(Debug, Clone, Copy)]
pub enum SpawnArea {
    /// All particles start at one point (a tight celebratory pop).
    Point { x: f64, y: f64 },
    /// Particles start spread along the top edge, just above view.
    TopEdge { width: f64 },
}

/// The caller-supplied ranges and palette for one burst.
#[derive(Debug, Clone)]
pub struct BurstStyle {
    pub count: usize,
    pub palette: Vec<Color>,
    /// Probability a particle is round rather than square.
    pub round_chance: f64,
    pub area: SpawnArea,
    /// Full width/height of the displacement range, centered on zero.
    pub spread: (f64, f64),
    /// Absolute y (relative to the container) the particles fall to;
    /// overrides the vertical spread when set.
    pub fall_to: Option<f64>,
    /// Maximum spin over the particle's lifetime, radians.
    pub max_spin: f64,
    pub end_opacity: f64,
    /// Seconds, sampled per particle.
    pub lifetime: Range<f64>,
    pub ease: Easing,
}

impl BurstStyle {
    /// The cake-cut burst: ~50 particles from a tight central origin,
    /// short-lived, spinning up to two full turns.
    pub fn confetti() -> Self {
        BurstStyle {
            count: 50,
            palette: CONFETTI_PALETTE.to_vec(),
            round_chance: 0.5,
            area: SpawnArea::Point { x: 0.0, y: 0.0 },
            spread: (40.0, 16.0),
            fall_to: None,
            max_spin: 4.0 * std::f64::consts::PI,
            end_opacity: 0.0,
            lifetime: 1.0..3.0,
            ease: Easing::QuadOut,
        }
    }

    /// The finale burst: ~80 particles raining from the full top edge,
    /// longer-lived, drifting sideways while they fall past the bottom.
    pub fn finale(width: f64, height: f64) -> Self {
        BurstStyle {
            count: 80,
            palette: FINALE_PALETTE.to_vec(),
            round_chance: 0.7,
            area: SpawnArea::TopEdge { width },
            spread: (20.0, 0.0),
            fall_to: Some(height + 2.0),
            max_spin: 6.0 * std::f64::consts::PI,
            end_opacity: 0.3,
            lifetime: 2.0..5.0,
            ease: Easing::QuadOut,
        }
    }
}

/// Tracks live particles so each can be reaped when its tween completes.
#[derive(Default)]
pub struct ParticleSystem {
    live: HashMap<TweenHandle, NodeId>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        ParticleSystem::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }

    /// Fire a burst under `container`. Fire-and-forget: an absent or stale
    /// container makes this a no-op.
    pub fn burst(
        &mut self,
        stage: &mut Stage,
        animator: &mut Animator,
        rng: &mut impl Rng,
        container: Option<NodeId>,
        style: &BurstStyle,
    ) {
        let Some(container) = container else { return };
        if stage.get(container).is_none() {
            return;
        }

        for _ in 0..style.count {
            let color = style.palette[rng.random_range(0..style.palette.len())];
            let round = rng.random_bool(style.round_chance);
            let big = rng.random_bool(0.5);
            let glyph = match (round, big) {
                (true, true) => '●',
                (true, false) => '•',
                (false, true) => '■',
                (false, false) => '▪',
            };

            let (x, y) = match style.area {
                SpawnArea::Point { x, y } => (x, y),
                SpawnArea::TopEdge { width } => (rng.random_range(0.0..width), -1.0),
            };

            let id = stage.spawn(
                Node::new(Sprite::glyph(glyph, Style::fg(color)))
                    .at(x, y)
                    .child_of(container)
                    .z(50),
            );

            let dx = rng.random_range(-style.spread.0 / 2.0..=style.spread.0 / 2.0);
            let end_y = match style.fall_to {
                Some(floor) => floor,
                None => y + rng.random_range(-style.spread.1 / 2.0..=style.spread.1 / 2.0),
            };
            let targets = [
                (Prop::PosX, x + dx),
                (Prop::PosY, end_y),
                (Prop::RotZ, rng.random_range(0.0..style.max_spin.max(1e-9))),
                (Prop::Opacity, style.end_opacity),
            ];
            let lifetime = rng.random_range(style.lifetime.clone());
            let handle =
                animator.animate(id, &targets, TweenConfig::secs(lifetime).ease(style.ease));
            self.live.insert(handle, id);
        }
    }

    /// Remove every particle whose tween just completed.
    pub fn sweep(&mut self, stage: &mut Stage, completed: &[TweenHandle]) {
        for handle in completed {
            if let Some(id) = self.live.remove(handle) {
                stage.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fixture() -> (Stage, Animator, ParticleSystem, StdRng, NodeId) {
        let mut stage = Stage::new();
        let host = stage.spawn(Node::new(Sprite::empty()).at(20.0, 10.0));
        (
            stage,
            Animator::new(),
            ParticleSystem::new(),
            StdRng::seed_from_u64(7),
            host,
        )
    }

    #[test]
    fn burst_spawns_exactly_count_particles() {
        let (mut stage, mut animator, mut particles, mut rng, host) = fixture();
        let style = BurstStyle::confetti();
        particles.burst(&mut stage, &mut animator, &mut rng, Some(host), &style);
        assert_eq!(stage.child_count(host), style.count);
        assert_eq!(particles.live_count(), style.count);
    }

    #[test]
    fn particles_are_reaped_as_their_tweens_complete() {
        let (mut stage, mut animator, mut particles, mut rng, host) = fixture();
        let style = BurstStyle::confetti();
        particles.burst(&mut stage, &mut animator, &mut rng, Some(host), &style);

        // Lifetimes cap at 3 s; run well past that.
        for _ in 0..40 {
            let done = animator.update(&mut stage, 0.1);
            particles.sweep(&mut stage, &done);
        }
        assert_eq!(stage.child_count(host), 0);
        assert_eq!(particles.live_count(), 0);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn missing_container_is_a_no_op() {
        let (mut stage, mut animator, mut particles, mut rng, host) = fixture();
        particles.burst(&mut stage, &mut animator, &mut rng, None, &BurstStyle::confetti());
        stage.remove(host);
        particles.burst(
            &mut stage,
            &mut animator,
            &mut rng,
            Some(host),
            &BurstStyle::confetti(),
        );
        assert_eq!(particles.live_count(), 0);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn finale_particles_fall_to_the_styled_floor() {
        let (mut stage, mut animator, mut particles, mut rng, host) = fixture();
        stage.get_mut(host).unwrap().transform.position = crate::engine::stage::Vec3::ZERO;
        let style = BurstStyle::finale(80.0, 24.0);
        particles.burst(&mut stage, &mut animator, &mut rng, Some(host), &style);

        // Drive every tween to completion, sampling y just before removal.
        let ids: Vec<NodeId> = stage.iter().filter(|(id, _)| *id != host).map(|(id, _)| id).collect();
        animator.update(&mut stage, 10.0);
        for id in ids {
            let (_, y) = stage.world_position(id).unwrap();
            assert!((y - 26.0).abs() < 1e-6);
        }
    }
}
