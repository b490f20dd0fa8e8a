//! The cake: a floating knife and eight slices cut one at a time.
//!
//! Each tap sends the knife to the next slice's angular position around the
//! rim, plunges it, detaches the slice outward along its radial angle, and
//! retracts the knife. The cut signal fires when the retract completes.

use crate::engine::stage::{Node, NodeId, Prop, Sprite, Stage};
use crate::engine::tween::{Animator, Easing, TweenConfig, TweenHandle};
use crate::types::{Color, NamedColor, Style, Viewport};

use std::f64::consts::{PI, TAU};

pub const SLICE_COUNT: u8 = 8;

const CAKE_ART: [&str; 6] = [
    "    i i i i i    ",
    "   _|_|_|_|_|_   ",
    "  {___________}  ",
    " {_____________} ",
    "{_______________}",
    "\\_______________/",
];

const KNIFE_ART: [&str; 4] = [
    "=#=",
    " | ",
    " | ",
    " V ",
];

const SLICE_ART: [&str; 2] = [
    " /\\ ",
    "/__\\",
];

const FALLBACK_ART: [&str; 5] = [
    ".--------------------.",
    "|   birthday cake    |",
    "|    * * * * *       |",
    "'--------------------'",
    "  Tap to cut a slice!",
];

/// How far the knife swings sideways to line up with a slice.
const RIM_REACH: f64 = 11.0;
/// Where a detached slice comes to rest, relative to the cake center.
const SLICE_OUT: f64 = 14.0;

struct SlicePiece {
    node: NodeId,
    angle: f64,
    cut: bool,
}

enum CutPhase {
    Travel(TweenHandle),
    Plunge(TweenHandle),
    Retract(TweenHandle),
}

pub struct Cake {
    cake_node: NodeId,
    knife: NodeId,
    slices: Vec<SlicePiece>,
    slices_cut: u8,
    cutting: bool,
    phase: Option<CutPhase>,
    knife_home: (f64, f64),
    center: (f64, f64),
}

impl Cake {
    pub fn mount(stage: &mut Stage, viewport: Viewport, rich: bool, root: NodeId) -> Self {
        let cx = viewport.center_x();
        let cy = viewport.center_y();
        let center = (cx, cy);
        let knife_home = (cx + 12.0, cy - 7.0);

        let (cake_node, knife) = if rich {
            let cake_node = stage.spawn(
                Node::new(Sprite::art(&CAKE_ART, Style::fg(Color::Named(NamedColor::Yellow))))
                    .at(cx - 8.0, cy - 3.0)
                    .child_of(root)
                    .z(10),
            );
            let knife = stage.spawn(
                Node::new(Sprite::art(&KNIFE_ART, Style::fg(Color::Named(NamedColor::White))))
                    .at(knife_home.0, knife_home.1)
                    .child_of(root)
                    .z(20),
            );
            (cake_node, knife)
        } else {
            let cake_node = stage.spawn(
                Node::new(Sprite::art(&FALLBACK_ART, Style::fg(Color::Named(NamedColor::Yellow))))
                    .at(cx - 11.0, cy - 2.0)
                    .child_of(root)
                    .z(10),
            );
            let knife = stage.spawn(Node::new(Sprite::empty()).child_of(root).hidden());
            (cake_node, knife)
        };

        // Slice i of 8 sits at angle i/8 · 2π; its node stays hidden until
        // the slice is cut loose.
        let slices = (0..SLICE_COUNT)
            .map(|i| {
                let angle = i as f64 / SLICE_COUNT as f64 * TAU;
                let node = stage.spawn(
                    Node::new(Sprite::art(&SLICE_ART, Style::fg(Color::Named(NamedColor::Yellow))))
                        .child_of(root)
                        .z(15)
                        .hidden(),
                );
                SlicePiece {
                    node,
                    angle,
                    cut: false,
                }
            })
            .collect();

        Cake {
            cake_node,
            knife,
            slices,
            slices_cut: 0,
            cutting: false,
            phase: None,
            knife_home,
            center,
        }
    }

    pub fn slices_cut(&self) -> u8 {
        self.slices_cut
    }

    pub fn is_cutting(&self) -> bool {
        self.cutting
    }

    /// Start the next cut. No-op while a cut is in flight or once every
    /// slice is gone. Returns whether a cut started.
    pub fn tap(&mut self, animator: &mut Animator) -> bool {
        if self.cutting || self.slices_cut >= SLICE_COUNT {
            return false;
        }
        self.cutting = true;

        let angle = self.slices[self.slices_cut as usize].angle;
        self.slices_cut += 1;

        let target_x = self.center.0 + angle.cos() * RIM_REACH - 1.0;
        let travel = animator.animate(
            self.knife,
            &[(Prop::PosX, target_x)],
            TweenConfig::secs(0.3).ease(Easing::QuadOut),
        );
        self.phase = Some(CutPhase::Travel(travel));
        true
    }

    /// Advance the cut pipeline on tween completions. Returns true exactly
    /// once per cut, when the knife has retracted.
    pub fn note_completed(
        &mut self,
        stage: &mut Stage,
        animator: &mut Animator,
        completed: &[TweenHandle],
    ) -> bool {
        let phase = match &self.phase {
            Some(p) => p,
            None => return false,
        };
        match phase {
            CutPhase::Travel(h) if completed.contains(h) => {
                let plunge = animator.animate(
                    self.knife,
                    &[(Prop::PosY, self.center.1 - 2.0), (Prop::RotX, 0.2 * PI)],
                    TweenConfig::secs(0.4).ease(Easing::QuadIn),
                );
                self.phase = Some(CutPhase::Plunge(plunge));
            }
            CutPhase::Plunge(h) if completed.contains(h) => {
                self.detach_slice(stage);
                let retract = animator.animate(
                    self.knife,
                    &[(Prop::PosY, self.knife_home.1), (Prop::RotX, 0.0)],
                    TweenConfig::secs(0.3).ease(Easing::QuadOut),
                );
                self.phase = Some(CutPhase::Retract(retract));
            }
            CutPhase::Retract(h) if completed.contains(h) => {
                self.phase = None;
                self.cutting = false;
                return true;
            }
            _ => {}
        }
        false
    }

    /// The just-cut slice pops out along its radial angle and keeps that
    /// position for the rest of the scene.
    fn detach_slice(&mut self, stage: &mut Stage) {
        let index = self.slices_cut.saturating_sub(1) as usize;
        let Some(slice) = self.slices.get_mut(index) else {
            return;
        };
        slice.cut = true;
        if let Some(node) = stage.get_mut(slice.node) {
            node.visible = true;
            node.transform.position.x = self.center.0 + slice.angle.cos() * SLICE_OUT - 2.0;
            node.transform.position.y = self.center.1 + slice.angle.sin() * 4.0;
            node.transform.rotation.y = slice.angle;
            node.transform.rotation.z = 0.1 * PI;
        }
    }

    /// Knife float and cake sway while no cut is in flight.
    pub fn tick_idle(&mut self, stage: &mut Stage, clock: f64) {
        if self.cutting {
            return;
        }
        if let Some(node) = stage.get_mut(self.knife) {
            node.transform.position.y = self.knife_home.1 + (clock * 1.5).sin() * 0.5;
            node.transform.rotation.z = (clock * 0.8).sin() * 0.05;
        }
        if let Some(node) = stage.get_mut(self.cake_node) {
            node.transform.rotation.y = (clock * 0.3).sin() * 0.1;
        }
    }
}
