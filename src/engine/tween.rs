//! Tween engine — time-based interpolation of node properties.
//!
//! One shared implementation drives every animation in the experience:
//! widget choreography, scene fades, and particle motion. A tween captures
//! its start values when it first advances past its delay, then interpolates
//! each channel toward its target with the configured easing, ping-ponging
//! on yoyo legs. Completion is reported exactly once, after the final leg.
//!
//! Two properties hold by construction:
//! - Single writer per channel: starting a tween on a (node, channel) pair
//!   strips that channel from every in-flight tween on the same node.
//! - A tween never stalls: a stripped-empty channel list, or a target node
//!   that has been removed, leaves the clock running so chained steps still
//!   fire on schedule.

use super::stage::{NodeId, Prop, Stage};

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    BackOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::BackOut => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct TweenConfig {
    /// Seconds per leg.
    pub duration: f64,
    pub ease: Easing,
    /// Seconds before the tween begins (and captures its start values).
    pub delay: f64,
    /// Ping-pong between start and target.
    pub yoyo: bool,
    /// Number of full back-and-forth cycles when `yoyo` is set.
    pub repeat: u32,
}

impl Default for TweenConfig {
    fn default() -> Self {
        TweenConfig {
            duration: 1.0,
            ease: Easing::Linear,
            delay: 0.0,
            yoyo: false,
            repeat: 0,
        }
    }
}

impl TweenConfig {
    pub fn secs(duration: f64) -> Self {
        TweenConfig {
            duration,
            ..TweenConfig::default()
        }
    }

    pub fn ease(mut self, ease: Easing) -> Self {
        self.ease = ease;
        self
    }

    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn yoyo(mut self, repeat: u32) -> Self {
        self.yoyo = true;
        self.repeat = repeat;
        self
    }

    fn legs(&self) -> u32 {
        if self.yoyo { (2 * self.repeat).max(1) } else { 1 }
    }

    /// Wall-clock seconds from start to completion, delay included.
    pub fn total_duration(&self) -> f64 {
        self.delay + self.legs() as f64 * self.duration
    }
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenHandle(u64);

struct Channel {
    prop: Prop,
    start: f64,
    end: f64,
}

struct ActiveTween {
    handle: TweenHandle,
    node: NodeId,
    channels: Vec<Channel>,
    captured: bool,
    config: TweenConfig,
    elapsed: f64,
}

/// Owns every in-flight tween and advances them all on one clock.
#[derive(Default)]
pub struct Animator {
    tweens: Vec<ActiveTween>,
    next_handle: u64,
}

impl Animator {
    pub fn new() -> Self {
        Animator::default()
    }

    /// Start a tween driving `targets` on `node`. An empty target list is a
    /// pure timer: it completes after `delay + duration` without writing.
    pub fn animate(
        &mut self,
        node: NodeId,
        targets: &[(Prop, f64)],
        config: TweenConfig,
    ) -> TweenHandle {
        // Single writer: claim these channels from in-flight tweens.
        for tween in &mut self.tweens {
            if tween.node == node {
                tween
                    .channels
                    .retain(|c| !targets.iter().any(|(p, _)| *p == c.prop));
            }
        }

        let handle = TweenHandle(self.next_handle);
        self.next_handle += 1;
        self.tweens.push(ActiveTween {
            handle,
            node,
            channels: targets
                .iter()
                .map(|(prop, end)| Channel {
                    prop: *prop,
                    start: 0.0,
                    end: *end,
                })
                .collect(),
            captured: false,
            config,
            elapsed: 0.0,
        });
        handle
    }

    /// A channel-less tween used as a settle/dwell timer within a
    /// choreography.
    pub fn timer(&mut self, node: NodeId, seconds: f64) -> TweenHandle {
        self.animate(node, &[], TweenConfig::secs(seconds))
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    /// Advance every tween by `dt` seconds, writing interpolated values into
    /// the stage. Returns the handles that completed during this update,
    /// each exactly once.
    pub fn update(&mut self, stage: &mut Stage, dt: f64) -> Vec<TweenHandle> {
        let mut done = Vec::new();

        for tween in &mut self.tweens {
            tween.elapsed += dt;
            let active = tween.elapsed - tween.config.delay;
            if active < 0.0 {
                continue;
            }

            if !tween.captured {
                if let Some(node) = stage.get(tween.node) {
                    for channel in &mut tween.channels {
                        channel.start = node.transform.get(channel.prop);
                    }
                }
                tween.captured = true;
            }

            let leg_duration = tween.config.duration.max(1e-9);
            let legs = tween.config.legs();
            let finished = active >= legs as f64 * leg_duration;
            let (leg, progress) = if finished {
                (legs - 1, 1.0)
            } else {
                let leg = (active / leg_duration) as u32;
                (leg, (active - leg as f64 * leg_duration) / leg_duration)
            };

            let eased = tween.config.ease.apply(progress);
            let reversing = tween.config.yoyo && leg % 2 == 1;
            let amount = if reversing { 1.0 - eased } else { eased };

            if let Some(node) = stage.get_mut(tween.node) {
                for channel in &tween.channels {
                    node.transform
                        .set(channel.prop, channel.start + (channel.end - channel.start) * amount);
                }
            }

            if finished {
                done.push(tween.handle);
            }
        }

        self.tweens.retain(|t| !done.contains(&t.handle));
        done
    }
}
