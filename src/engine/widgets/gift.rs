//! The gift box: idle sway, then a one-shot unwrap choreography.

use crate::engine::stage::{scale_uniform, Node, NodeId, Prop, Sprite, Stage};
use crate::engine::tween::{Animator, Easing, TweenConfig, TweenHandle};
use crate::types::{Color, NamedColor, Style, Viewport};

use std::f64::consts::PI;

const BOX_ART: [&str; 4] = [
    "|          |",
    "|          |",
    "|          |",
    "'----------'",
];

const LID_ART: [&str; 2] = [
    " __________ ",
    "[__________]",
];

const RIBBON_ART: [&str; 5] = [
    r"\/\/",
    " || ",
    " || ",
    " || ",
    " || ",
];

const FALLBACK_ART: [&str; 5] = [
    ".--------------------.",
    "|    a gift for      |",
    "|        you         |",
    "'--------------------'",
    "    Tap to open!",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftState {
    Idle,
    Animating,
    Done,
}

pub struct GiftBox {
    state: GiftState,
    hovered: bool,
    box_node: NodeId,
    lid: NodeId,
    ribbon: NodeId,
    home: (f64, f64),
    swell: Option<TweenHandle>,
    settle: Option<TweenHandle>,
}

impl GiftBox {
    /// Build the widget's nodes under `root`. With `rich` unset this mounts
    /// the static tap-target variant; the open signal works the same way.
    pub fn mount(stage: &mut Stage, viewport: Viewport, rich: bool, root: NodeId) -> Self {
        let cx = viewport.center_x();
        let cy = viewport.center_y();

        let (box_node, lid, ribbon, home) = if rich {
            let home = (cx - 6.0, cy - 1.0);
            let box_node = stage.spawn(
                Node::new(Sprite::art(&BOX_ART, Style::fg(Color::Named(NamedColor::Magenta))))
                    .at(home.0, home.1)
                    .child_of(root)
                    .z(10),
            );
            let lid = stage.spawn(
                Node::new(Sprite::art(&LID_ART, Style::fg(Color::Named(NamedColor::Magenta))))
                    .at(cx - 6.0, cy - 3.0)
                    .child_of(root)
                    .z(12),
            );
            let ribbon = stage.spawn(
                Node::new(Sprite::art(&RIBBON_ART, Style::fg(Color::Named(NamedColor::Red))))
                    .at(cx - 2.0, cy - 4.0)
                    .child_of(root)
                    .z(14),
            );
            (box_node, lid, ribbon, home)
        } else {
            let home = (cx - 11.0, cy - 2.0);
            let box_node = stage.spawn(
                Node::new(Sprite::art(&FALLBACK_ART, Style::fg(Color::Named(NamedColor::Magenta))))
                    .at(home.0, home.1)
                    .child_of(root)
                    .z(10),
            );
            let lid = stage.spawn(Node::new(Sprite::empty()).child_of(root).hidden());
            let ribbon = stage.spawn(Node::new(Sprite::empty()).child_of(root).hidden());
            (box_node, lid, ribbon, home)
        };

        GiftBox {
            state: GiftState::Idle,
            hovered: false,
            box_node,
            lid,
            ribbon,
            home,
            swell: None,
            settle: None,
        }
    }

    pub fn state(&self) -> GiftState {
        self.state
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// First tap starts the unwrap; taps while animating or done are no-ops.
    /// Returns whether the choreography started.
    pub fn tap(&mut self, animator: &mut Animator) -> bool {
        if self.state != GiftState::Idle {
            return false;
        }
        self.state = GiftState::Animating;

        // Ribbon: drops, spins away, shrinks.
        animator.animate(
            self.ribbon,
            &[(Prop::PosY, self.home.1 + 6.0)],
            TweenConfig::secs(0.8).ease(Easing::QuadIn),
        );
        animator.animate(
            self.ribbon,
            &[(Prop::RotX, 2.0 * PI), (Prop::RotY, PI)],
            TweenConfig::secs(1.0).ease(Easing::QuadOut).delay(0.4),
        );
        animator.animate(
            self.ribbon,
            &scale_uniform(0.1),
            TweenConfig::secs(0.5).delay(0.5),
        );

        // Box: quick lateral shake.
        animator.animate(
            self.box_node,
            &[(Prop::PosX, self.home.0 + 0.6)],
            TweenConfig::secs(0.05).yoyo(5),
        );

        // Lid: pops up, tips open.
        animator.animate(
            self.lid,
            &[(Prop::PosY, self.home.1 - 6.0)],
            TweenConfig::secs(0.4).ease(Easing::QuadOut).delay(0.3),
        );
        animator.animate(
            self.lid,
            &[(Prop::RotX, 0.3 * PI)],
            TweenConfig::secs(0.5).ease(Easing::BackOut).delay(0.5),
        );

        // Box swells once the lid is open; the settle timer after the swell
        // is the open signal.
        self.swell = Some(animator.animate(
            self.box_node,
            &scale_uniform(1.2),
            TweenConfig::secs(0.5).delay(1.0),
        ));
        true
    }

    /// Continuous motion while idle: gentle yaw sway, hover bob, ribbon
    /// flutter. Frozen as soon as the unwrap starts.
    pub fn tick_idle(&mut self, stage: &mut Stage, clock: f64) {
        if self.state != GiftState::Idle {
            return;
        }
        if let Some(node) = stage.get_mut(self.box_node) {
            node.transform.rotation.y = (clock * 0.5).sin() * 0.1;
            node.transform.position.y = if self.hovered {
                self.home.1 + (clock * 2.0).sin() * 0.6
            } else {
                self.home.1
            };
        }
        if let Some(node) = stage.get_mut(self.ribbon) {
            node.transform.rotation.z = (clock * 1.5).sin() * 0.05;
        }
    }

    /// Feed the animator's completed handles through the choreography.
    /// Returns true exactly once per cycle, when the gift has fully opened.
    pub fn note_completed(&mut self, animator: &mut Animator, completed: &[TweenHandle]) -> bool {
        if let Some(swell) = self.swell {
            if completed.contains(&swell) {
                self.swell = None;
                self.settle = Some(animator.timer(self.box_node, 0.5));
            }
        }
        if let Some(settle) = self.settle {
            if completed.contains(&settle) {
                self.settle = None;
                self.state = GiftState::Done;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(rich: bool) -> (Stage, Animator, GiftBox) {
        let mut stage = Stage::new();
        let root = stage.spawn(Node::new(Sprite::empty()));
        let gift = GiftBox::mount(&mut stage, Viewport::new(80, 24), rich, root);
        (stage, Animator::new(), gift)
    }

    fn run_until_open(stage: &mut Stage, animator: &mut Animator, gift: &mut GiftBox) -> (f64, u32) {
        let mut opens = 0;
        let mut opened_at = 0.0;
        let mut clock = 0.0;
        for _ in 0..80 {
            clock += 0.05;
            let done = animator.update(stage, 0.05);
            if gift.note_completed(animator, &done) {
                opens += 1;
                if opened_at == 0.0 {
                    opened_at = clock;
                }
            }
        }
        (opened_at, opens)
    }

    #[test]
    fn tap_starts_choreography_once() {
        let (_stage, mut animator, mut gift) = fixture(true);
        assert!(gift.tap(&mut animator));
        let started = animator.active_count();
        assert!(started >= 6);

        // Second tap while animating must not start anything.
        assert!(!gift.tap(&mut animator));
        assert_eq!(animator.active_count(), started);
        assert_eq!(gift.state(), GiftState::Animating);
    }

    #[test]
    fn open_fires_once_after_swell_and_settle() {
        let (mut stage, mut animator, mut gift) = fixture(true);
        gift.tap(&mut animator);
        let (opened_at, opens) = run_until_open(&mut stage, &mut animator, &mut gift);
        assert_eq!(opens, 1);
        // Swell ends at 1.5 s, settle adds 0.5 s.
        assert!((opened_at - 2.0).abs() < 0.051, "opened at {opened_at}");
        assert_eq!(gift.state(), GiftState::Done);

        // Done is terminal until the scene remounts.
        assert!(!gift.tap(&mut animator));
    }

    #[test]
    fn fallback_mount_still_reaches_open() {
        let (mut stage, mut animator, mut gift) = fixture(false);
        assert!(gift.tap(&mut animator));
        let (_, opens) = run_until_open(&mut stage, &mut animator, &mut gift);
        assert_eq!(opens, 1);
    }

    #[test]
    fn idle_motion_stops_when_animating() {
        let (mut stage, mut animator, mut gift) = fixture(true);
        gift.tick_idle(&mut stage, 1.3);
        let swayed = stage.get(gift.box_node).unwrap().transform.rotation.y;
        assert!(swayed.abs() > 0.0);

        gift.tap(&mut animator);
        stage.get_mut(gift.box_node).unwrap().transform.rotation.y = 0.0;
        gift.tick_idle(&mut stage, 2.6);
        assert_eq!(stage.get(gift.box_node).unwrap().transform.rotation.y, 0.0);
    }
}
