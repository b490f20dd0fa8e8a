//! Scene controller — the state machine at the root of the experience.
//!
//! Owns the active scene, the session flags, the stage, and every timed
//! transition. Choreography between scenes is data: tween completions map
//! to follow-up steps, and countdown timers carry steps of their own, all
//! executed by the single `update` driver. Any missing node handle skips
//! its visual step while the step machinery still fires, so the state
//! machine never stalls on a degraded stage.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio::{AudioAdapter, SoundKind};
use crate::config::Greeting;
use crate::types::{Color, NamedColor, Style, Tap, Viewport};

use super::particles::{BurstStyle, ParticleSystem};
use super::stage::{Node, NodeId, Prop, Sprite, Stage};
use super::tween::{Animator, Easing, TweenConfig, TweenHandle};
use super::widgets::{Cake, GiftBox};

// ---------------------------------------------------------------------------
// Scenes and flags
// ---------------------------------------------------------------------------

/// The six stages of the experience, in order. Transitions only move
/// forward, except the explicit Finale → Gift replay reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    Gift,
    Entrance,
    CakeArrival,
    CakeCut,
    Message,
    Finale,
}

impl Scene {
    /// The affordance line the player shows for this scene.
    pub fn hint(&self) -> &'static str {
        match self {
            Scene::Gift => "[Tap] open the gift",
            Scene::Entrance => "[Tap] take the bouquet",
            Scene::CakeArrival => "the cake is on its way...",
            Scene::CakeCut => "[Tap] cut a slice",
            Scene::Message => "[Tap] continue",
            Scene::Finale => "[Tap] replay",
        }
    }
}

/// Cross-scene session state. Each flag flips false → true at most once per
/// cycle and is cleared by the replay reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub audio_enabled: bool,
    pub cake_sliced: bool,
    pub message_displayed: bool,
}

// ---------------------------------------------------------------------------
// Choreography steps
// ---------------------------------------------------------------------------

/// One deferred unit of scene choreography, fired either when a tween
/// completes or when a countdown timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SwitchTo(Scene),
    /// Entrance: bounce after the slide-in, then show the bubble.
    EntranceBounce,
    ShowBubble,
    /// Cake arrival: dwell after the carry-in, then move to cutting.
    ArrivalDwell,
    /// Message popped: set the flag and arm the finale timer.
    MessageShown,
    /// Finale: one burst, with this many still to fire (including it).
    FinaleBurst(u8),
}

struct Timer {
    remaining: f64,
    step: Step,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct SceneController {
    scene: Scene,
    flags: SessionFlags,
    stage: Stage,
    animator: Animator,
    particles: ParticleSystem,
    rng: StdRng,
    audio: Box<dyn AudioAdapter>,
    viewport: Viewport,
    greeting: Greeting,
    rich: bool,
    clock: f64,

    gift: Option<GiftBox>,
    cake: Option<Cake>,
    root: Option<NodeId>,
    character: Option<NodeId>,
    bubble: Option<NodeId>,
    message: Option<NodeId>,
    confetti_host: Option<NodeId>,

    timers: Vec<Timer>,
    after_tween: HashMap<TweenHandle, Step>,
    /// A scene-exit choreography is in flight; further triggers are no-ops.
    leaving: bool,
    cut_signals: u32,
}

const CHARACTER_ART: [&str; 5] = [
    "   ___  __     ",
    "  /. .\\/  \\_   ",
    " (  ^  )    \\  ",
    "  \\__/ |  |\\ \\ ",
    "   ||  |__| \\_\\",
];

const CHARACTER_CAKE_ART: [&str; 5] = [
    "   ___  __  ii ",
    "  /. .\\/  \\[==]",
    " (  ^  )   |~~|",
    "  \\__/ |  ||__|",
    "   ||  |__|    ",
];

impl SceneController {
    pub fn new(
        audio: Box<dyn AudioAdapter>,
        greeting: Greeting,
        viewport: Viewport,
        rich: bool,
    ) -> Self {
        let mut controller = SceneController {
            scene: Scene::Gift,
            flags: SessionFlags::default(),
            stage: Stage::new(),
            animator: Animator::new(),
            particles: ParticleSystem::new(),
            rng: StdRng::from_os_rng(),
            audio,
            viewport,
            greeting,
            rich,
            clock: 0.0,
            gift: None,
            cake: None,
            root: None,
            character: None,
            bubble: None,
            message: None,
            confetti_host: None,
            timers: Vec::new(),
            after_tween: HashMap::new(),
            leaving: false,
            cut_signals: 0,
        };
        controller.mount_scene(Scene::Gift);
        controller
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn hint(&self) -> &'static str {
        self.scene.hint()
    }

    pub fn slices_cut(&self) -> u8 {
        self.cake.as_ref().map(|c| c.slices_cut()).unwrap_or(0)
    }

    /// Cut signals delivered this cycle (cleared on replay).
    pub fn cut_signals(&self) -> u32 {
        self.cut_signals
    }

    /// Hover state for the gift's bob animation; forwarded by the player
    /// from pointer motion.
    pub fn set_hover(&mut self, hovered: bool) {
        if let Some(gift) = self.gift.as_mut() {
            gift.set_hovered(hovered);
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn tap(&mut self, tap: Tap) {
        match (self.scene, tap) {
            (Scene::Gift, Tap::Gift) => {
                let Some(gift) = self.gift.as_mut() else {
                    return;
                };
                if gift.tap(&mut self.animator) {
                    self.flags.audio_enabled = true;
                    let _ = self.audio.play(SoundKind::Unwrap);
                }
            }
            (Scene::CakeCut, Tap::Cake) => {
                if let Some(cake) = self.cake.as_mut() {
                    cake.tap(&mut self.animator);
                }
            }
            (Scene::Entrance, Tap::Advance) => {
                if self.leaving {
                    return;
                }
                self.leaving = true;
                if let Some(bubble) = self.bubble {
                    self.animator.animate(
                        bubble,
                        &[(Prop::Opacity, 0.0), (Prop::ScaleX, 0.5), (Prop::ScaleY, 0.5)],
                        TweenConfig::secs(0.3),
                    );
                }
                self.chain(
                    self.character,
                    &[(Prop::PosX, -30.0)],
                    TweenConfig::secs(1.0).ease(Easing::QuadIn),
                    Step::SwitchTo(Scene::CakeArrival),
                );
            }
            (Scene::Message, Tap::Advance) => {
                self.apply(Step::SwitchTo(Scene::Finale));
            }
            (Scene::Finale, Tap::Advance) => {
                self.reset();
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Frame driver
    // -----------------------------------------------------------------------

    /// Advance the whole experience by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        self.clock += dt;

        let completed = self.animator.update(&mut self.stage, dt);
        self.particles.sweep(&mut self.stage, &completed);

        // Widget signals.
        let mut opened = false;
        if let Some(gift) = self.gift.as_mut() {
            opened = gift.note_completed(&mut self.animator, &completed);
        }
        let mut cut = false;
        if let Some(cake) = self.cake.as_mut() {
            cut = cake.note_completed(&mut self.stage, &mut self.animator, &completed);
        }

        if opened && self.scene == Scene::Gift && !self.leaving {
            self.leaving = true;
            self.chain(
                self.root,
                &[(Prop::Opacity, 0.0), (Prop::ScaleX, 1.5), (Prop::ScaleY, 1.5)],
                TweenConfig::secs(0.8).ease(Easing::QuadIn),
                Step::SwitchTo(Scene::Entrance),
            );
        }
        if cut && self.scene == Scene::CakeCut {
            self.on_cut();
        }

        // Tween-chained steps.
        let steps: Vec<Step> = completed
            .iter()
            .filter_map(|h| self.after_tween.remove(h))
            .collect();
        for step in steps {
            let before = self.scene;
            self.apply(step);
            if self.scene != before {
                break;
            }
        }

        // Countdown timers.
        let mut due = Vec::new();
        self.timers.retain_mut(|timer| {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                due.push(timer.step);
                false
            } else {
                true
            }
        });
        for step in due {
            let before = self.scene;
            self.apply(step);
            if self.scene != before {
                break;
            }
        }

        // Idle motion for the scene's widget.
        let clock = self.clock;
        match self.scene {
            Scene::Gift => {
                if let Some(gift) = self.gift.as_mut() {
                    gift.tick_idle(&mut self.stage, clock);
                }
            }
            Scene::CakeCut => {
                if let Some(cake) = self.cake.as_mut() {
                    cake.tick_idle(&mut self.stage, clock);
                }
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    fn apply(&mut self, step: Step) {
        match step {
            Step::SwitchTo(scene) => self.mount_scene(scene),
            Step::EntranceBounce => {
                let bounce_to = self
                    .character
                    .and_then(|id| self.stage.get(id))
                    .map(|n| n.transform.position.y - 1.5);
                match bounce_to {
                    Some(y) => self.chain(
                        self.character,
                        &[(Prop::PosY, y)],
                        TweenConfig::secs(0.4).ease(Easing::QuadOut).yoyo(3),
                        Step::ShowBubble,
                    ),
                    None => self.apply(Step::ShowBubble),
                }
            }
            Step::ShowBubble => {
                if let Some(bubble) = self.bubble {
                    self.animator.animate(
                        bubble,
                        &[
                            (Prop::Opacity, 1.0),
                            (Prop::ScaleX, 1.0),
                            (Prop::ScaleY, 1.0),
                            (Prop::ScaleZ, 1.0),
                        ],
                        TweenConfig::secs(0.5).ease(Easing::BackOut),
                    );
                }
            }
            Step::ArrivalDwell => {
                self.timers.push(Timer {
                    remaining: 2.0,
                    step: Step::SwitchTo(Scene::CakeCut),
                });
            }
            Step::MessageShown => {
                if self.scene == Scene::Message {
                    self.flags.message_displayed = true;
                }
                self.timers.push(Timer {
                    remaining: 6.0,
                    step: Step::SwitchTo(Scene::Finale),
                });
            }
            Step::FinaleBurst(left) => {
                let style = BurstStyle::finale(self.viewport.width, self.viewport.height);
                self.particles.burst(
                    &mut self.stage,
                    &mut self.animator,
                    &mut self.rng,
                    self.confetti_host,
                    &style,
                );
                if left > 1 {
                    self.timers.push(Timer {
                        remaining: 0.3,
                        step: Step::FinaleBurst(left - 1),
                    });
                }
            }
        }
    }

    /// Run `targets` on `node` and chain `next` to its completion. A missing
    /// node degrades to a bare timer of the same length: the visuals are
    /// skipped but the transition still fires.
    fn chain(
        &mut self,
        node: Option<NodeId>,
        targets: &[(Prop, f64)],
        config: TweenConfig,
        next: Step,
    ) {
        match node {
            Some(id) => {
                let handle = self.animator.animate(id, targets, config);
                self.after_tween.insert(handle, next);
            }
            None => {
                self.timers.push(Timer {
                    remaining: config.total_duration(),
                    step: next,
                });
            }
        }
    }

    fn on_cut(&mut self) {
        self.cut_signals += 1;
        let _ = self.audio.play(SoundKind::Cheer);
        self.flags.cake_sliced = true;
        self.particles.burst(
            &mut self.stage,
            &mut self.animator,
            &mut self.rng,
            self.confetti_host,
            &BurstStyle::confetti(),
        );
        // One fixed delay after the most recent cut, so the confetti of the
        // final cut still plays out before the message.
        self.timers
            .retain(|t| t.step != Step::SwitchTo(Scene::Message));
        self.timers.push(Timer {
            remaining: 4.0,
            step: Step::SwitchTo(Scene::Message),
        });
    }

    /// Full replay reset: flags cleared, ambient stopped, stage rebuilt.
    fn reset(&mut self) {
        self.flags = SessionFlags::default();
        self.audio.stop_ambient();
        self.clock = 0.0;
        self.cut_signals = 0;
        self.mount_scene(Scene::Gift);
    }

    // -----------------------------------------------------------------------
    // Scene mounting
    // -----------------------------------------------------------------------

    /// Tear down the previous scene entirely and build the next one. Exactly
    /// one scene's content exists at any time.
    fn mount_scene(&mut self, scene: Scene) {
        self.animator.clear();
        self.particles.clear();
        self.after_tween.clear();
        self.timers.clear();
        self.stage.clear();
        self.gift = None;
        self.cake = None;
        self.character = None;
        self.bubble = None;
        self.message = None;
        self.confetti_host = None;
        self.leaving = false;
        self.scene = scene;

        let root = self.stage.spawn(Node::new(Sprite::empty()));
        self.root = Some(root);

        let vw = self.viewport;
        match scene {
            Scene::Gift => {
                self.title(root, "*  S U R P R I S E  *");
                self.gift = Some(GiftBox::mount(&mut self.stage, vw, self.rich, root));
            }
            Scene::Entrance => {
                let cy = vw.center_y();
                let character = self.stage.spawn(
                    Node::new(Sprite::art(&CHARACTER_ART, Style::fg(Color::Named(NamedColor::Cyan))))
                        .at(vw.width + 4.0, cy - 2.0)
                        .child_of(root)
                        .z(10),
                );
                self.character = Some(character);

                let bubble_sprite = framed_sprite(
                    &[self.greeting.bubble_text.clone()],
                    Style::fg(Color::Named(NamedColor::White)),
                );
                let bw = bubble_sprite.width() as f64;
                let bubble = self.stage.spawn(
                    Node::new(bubble_sprite)
                        .at(vw.center_x() - bw / 2.0, cy - 9.0)
                        .child_of(root)
                        .z(20)
                        .faded(),
                );
                self.bubble = Some(bubble);

                self.chain(
                    self.character,
                    &[(Prop::PosX, vw.center_x() - 7.0)],
                    TweenConfig::secs(1.5).ease(Easing::QuadOut),
                    Step::EntranceBounce,
                );

                if self.flags.audio_enabled {
                    let _ = self.audio.start_ambient(0.3);
                }
            }
            Scene::CakeArrival => {
                self.title(root, "H A P P Y   B I R T H D A Y   T O   Y O U");
                let character = self.stage.spawn(
                    Node::new(Sprite::art(
                        &CHARACTER_CAKE_ART,
                        Style::fg(Color::Named(NamedColor::Cyan)),
                    ))
                    .at(vw.width + 4.0, vw.center_y() - 2.0)
                    .child_of(root)
                    .z(10),
                );
                self.character = Some(character);
                self.chain(
                    self.character,
                    &[(Prop::PosX, vw.center_x() - 7.0)],
                    TweenConfig::secs(1.5).ease(Easing::QuadOut).delay(0.5),
                    Step::ArrivalDwell,
                );
            }
            Scene::CakeCut => {
                self.title(root, "Time to cut the cake!");
                self.cake = Some(Cake::mount(&mut self.stage, vw, self.rich, root));
                let host = self.stage.spawn(
                    Node::new(Sprite::empty())
                        .at(vw.center_x(), vw.center_y())
                        .child_of(root),
                );
                self.confetti_host = Some(host);
            }
            Scene::Message => {
                let character = self.stage.spawn(
                    Node::new(Sprite::art(&CHARACTER_ART, Style::fg(Color::Named(NamedColor::Cyan))))
                        .at(6.0, vw.center_y() + 2.0)
                        .child_of(root)
                        .z(10),
                );
                self.character = Some(character);
                self.animator.animate(
                    character,
                    &[(Prop::ScaleX, 1.2), (Prop::ScaleY, 1.2)],
                    TweenConfig::secs(0.8).ease(Easing::QuadOut),
                );

                let message_sprite = self.message_sprite();
                let mw = message_sprite.width() as f64;
                let message = self.stage.spawn(
                    Node::new(message_sprite)
                        .at(vw.center_x() - mw / 2.0 + 6.0, 2.0)
                        .child_of(root)
                        .z(20)
                        .faded(),
                );
                self.message = Some(message);
                self.chain(
                    self.message,
                    &[
                        (Prop::Opacity, 1.0),
                        (Prop::ScaleX, 1.0),
                        (Prop::ScaleY, 1.0),
                        (Prop::ScaleZ, 1.0),
                    ],
                    TweenConfig::secs(0.6).ease(Easing::BackOut),
                    Step::MessageShown,
                );
            }
            Scene::Finale => {
                self.title(root, "*  H A P P Y   B I R T H D A Y !  *");
                let sub = "Wishing you the most wonderful day!";
                self.stage.spawn(
                    Node::new(Sprite::text(sub, Style::fg(Color::Named(NamedColor::White))))
                        .at(vw.center_x() - sub.chars().count() as f64 / 2.0, vw.center_y())
                        .child_of(root)
                        .z(10),
                );
                let host = self
                    .stage
                    .spawn(Node::new(Sprite::empty()).at(0.0, 0.0).child_of(root));
                self.confetti_host = Some(host);

                self.apply(Step::FinaleBurst(5));
                self.audio.set_ambient_volume(0.6);
            }
        }
    }

    fn title(&mut self, root: NodeId, text: &str) {
        let x = self.viewport.center_x() - text.chars().count() as f64 / 2.0;
        let style = Style {
            fg: Some(Color::Named(NamedColor::Yellow)),
            bold: true,
            ..Style::default()
        };
        self.stage
            .spawn(Node::new(Sprite::text(text, style)).at(x, 1.0).child_of(root).z(30));
    }

    fn message_sprite(&self) -> Sprite {
        let mut lines = vec![format!("Dear {},", self.greeting.recipient), String::new()];
        for paragraph in &self.greeting.paragraphs {
            lines.extend(wrap(paragraph, 44));
            lines.push(String::new());
        }
        lines.push(format!("{},", self.greeting.signature));
        framed_sprite(&lines, Style::fg(Color::Named(NamedColor::White)))
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A speech-bubble/card border around text lines.
fn framed_sprite(lines: &[String], style: Style) -> Sprite {
    let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!(".{}.", "-".repeat(inner + 2)));
    for line in lines {
        let pad = inner - line.chars().count();
        out.push(format!("| {}{} |", line, " ".repeat(pad)));
    }
    out.push(format!("'{}'", "-".repeat(inner + 2)));
    Sprite { lines: out, style }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentAudio;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every adapter call so tests can assert the audio contract.
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum AudioEvent {
        Play(SoundKind),
        StartAmbient(f64),
        SetVolume(f64),
        StopAmbient,
    }

    struct RecordingAudio(Rc<RefCell<Vec<AudioEvent>>>);

    impl AudioAdapter for RecordingAudio {
        fn play(&mut self, kind: SoundKind) -> bool {
            self.0.borrow_mut().push(AudioEvent::Play(kind));
            true
        }

        fn start_ambient(&mut self, volume: f64) -> bool {
            self.0.borrow_mut().push(AudioEvent::StartAmbient(volume));
            true
        }

        fn set_ambient_volume(&mut self, volume: f64) {
            self.0.borrow_mut().push(AudioEvent::SetVolume(volume));
        }

        fn stop_ambient(&mut self) {
            self.0.borrow_mut().push(AudioEvent::StopAmbient);
        }
    }

    fn controller() -> SceneController {
        SceneController::new(
            Box::new(SilentAudio),
            Greeting::default(),
            Viewport::new(80, 24),
            true,
        )
    }

    /// Step at 50 fps until the predicate holds, returning elapsed seconds.
    fn run_until(
        c: &mut SceneController,
        budget: f64,
        pred: impl Fn(&SceneController) -> bool,
    ) -> Option<f64> {
        let mut elapsed = 0.0;
        while elapsed < budget {
            c.update(0.02);
            elapsed += 0.02;
            if pred(c) {
                return Some(elapsed);
            }
        }
        None
    }

    #[test]
    fn starts_in_the_gift_scene_with_clear_flags() {
        let c = controller();
        assert_eq!(c.scene(), Scene::Gift);
        assert_eq!(c.flags(), SessionFlags::default());
        assert!(!c.stage().is_empty());
    }

    #[test]
    fn gift_tap_enables_audio_and_reaches_entrance() {
        let mut c = controller();
        c.tap(Tap::Gift);
        assert!(c.flags().audio_enabled);

        // Unwrap (2.0 s) plus the 0.8 s scene fade.
        let at = run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance)
            .expect("never reached the entrance");
        assert!((2.6..=3.3).contains(&at), "arrived at {at}");
    }

    #[test]
    fn second_gift_tap_does_not_double_trigger() {
        let mut c = controller();
        c.tap(Tap::Gift);
        c.update(0.5);
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance)
            .expect("never reached the entrance");
        // A double trigger would have queued a second switch that fires
        // after the remount and tears the entrance down again.
        c.update(1.0);
        assert_eq!(c.scene(), Scene::Entrance);
    }

    #[test]
    fn wrong_tap_kind_for_the_scene_is_ignored() {
        let mut c = controller();
        c.tap(Tap::Cake);
        c.tap(Tap::Advance);
        c.update(1.0);
        assert_eq!(c.scene(), Scene::Gift);
        assert!(!c.flags().audio_enabled);
    }

    #[test]
    fn entrance_advance_carries_on_to_cake_arrival_then_cutting() {
        let mut c = controller();
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();

        c.tap(Tap::Advance);
        // Repeated taps while the exit runs must not re-trigger.
        c.tap(Tap::Advance);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::CakeArrival)
            .expect("never reached the arrival");
        run_until(&mut c, 10.0, |c| c.scene() == Scene::CakeCut)
            .expect("never reached cutting");
    }

    #[test]
    fn every_cut_re_arms_the_message_timer() {
        let mut c = controller();
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();
        c.tap(Tap::Advance);
        run_until(&mut c, 15.0, |c| c.scene() == Scene::CakeCut).unwrap();

        c.tap(Tap::Cake);
        run_until(&mut c, 5.0, |c| c.cut_signals() == 1).expect("first cut never landed");
        assert!(c.flags().cake_sliced);

        // A second cut 2 s later pushes the transition out; 3 s after the
        // first cut we must still be cutting, 4 s after the second we move.
        c.update(2.0);
        c.tap(Tap::Cake);
        run_until(&mut c, 5.0, |c| c.cut_signals() == 2).expect("second cut never landed");
        let at = run_until(&mut c, 10.0, |c| c.scene() == Scene::Message)
            .expect("never reached the message");
        assert!((3.5..=4.5).contains(&at), "switched at {at}");
    }

    #[test]
    fn eight_spaced_cuts_then_message_after_the_fixed_delay() {
        let mut c = controller();
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();
        c.tap(Tap::Advance);
        run_until(&mut c, 15.0, |c| c.scene() == Scene::CakeCut).unwrap();

        for i in 0..8u32 {
            c.tap(Tap::Cake);
            run_until(&mut c, 5.0, |c| c.cut_signals() == i + 1)
                .expect("cut never landed");
        }
        assert_eq!(c.slices_cut(), 8);
        assert!(c.flags().cake_sliced);

        let at = run_until(&mut c, 10.0, |c| c.scene() == Scene::Message)
            .expect("never reached the message");
        assert!((3.5..=4.5).contains(&at), "switched at {at}");
    }

    #[test]
    fn message_sets_its_flag_and_times_out_into_the_finale() {
        let mut c = controller();
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();
        c.tap(Tap::Advance);
        run_until(&mut c, 15.0, |c| c.scene() == Scene::CakeCut).unwrap();
        c.tap(Tap::Cake);
        run_until(&mut c, 10.0, |c| c.scene() == Scene::Message).unwrap();

        run_until(&mut c, 2.0, |c| c.flags().message_displayed)
            .expect("message flag never set");
        let at = run_until(&mut c, 10.0, |c| c.scene() == Scene::Finale)
            .expect("never reached the finale");
        assert!((5.0..=6.5).contains(&at), "finale at {at}");
    }

    #[test]
    fn finale_tap_replays_from_a_clean_slate() {
        let mut c = controller();
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();
        c.tap(Tap::Advance);
        run_until(&mut c, 15.0, |c| c.scene() == Scene::CakeCut).unwrap();
        c.tap(Tap::Cake);
        run_until(&mut c, 10.0, |c| c.scene() == Scene::Message).unwrap();
        c.tap(Tap::Advance);
        assert_eq!(c.scene(), Scene::Finale);

        c.tap(Tap::Advance);
        assert_eq!(c.scene(), Scene::Gift);
        assert_eq!(c.flags(), SessionFlags::default());
        assert_eq!(c.cut_signals(), 0);
        // The new gift responds to taps again.
        c.tap(Tap::Gift);
        assert!(c.flags().audio_enabled);
    }

    #[test]
    fn finale_bursts_keep_staggering_in() {
        let mut c = controller();
        c.tap(Tap::Gift);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();
        c.tap(Tap::Advance);
        run_until(&mut c, 15.0, |c| c.scene() == Scene::CakeCut).unwrap();
        c.tap(Tap::Cake);
        run_until(&mut c, 10.0, |c| c.scene() == Scene::Message).unwrap();
        c.tap(Tap::Advance);

        // First burst fires on mount; four more arrive over 1.2 s.
        let first = c.stage().len();
        c.update(1.5);
        assert!(c.stage().len() > first);
    }

    #[test]
    fn audio_contract_over_a_full_cycle() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut c = SceneController::new(
            Box::new(RecordingAudio(log.clone())),
            Greeting::default(),
            Viewport::new(80, 24),
            true,
        );

        c.tap(Tap::Gift);
        assert_eq!(log.borrow()[0], AudioEvent::Play(SoundKind::Unwrap));

        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance).unwrap();
        assert!(log.borrow().contains(&AudioEvent::StartAmbient(0.3)));

        c.tap(Tap::Advance);
        run_until(&mut c, 15.0, |c| c.scene() == Scene::CakeCut).unwrap();
        c.tap(Tap::Cake);
        run_until(&mut c, 5.0, |c| c.cut_signals() == 1).unwrap();
        assert!(log.borrow().contains(&AudioEvent::Play(SoundKind::Cheer)));

        run_until(&mut c, 10.0, |c| c.scene() == Scene::Message).unwrap();
        c.tap(Tap::Advance);
        assert!(log.borrow().contains(&AudioEvent::SetVolume(0.6)));

        c.tap(Tap::Advance);
        assert_eq!(*log.borrow().last().unwrap(), AudioEvent::StopAmbient);
        assert_eq!(c.scene(), Scene::Gift);
    }

    #[test]
    fn silent_audio_never_blocks_progress() {
        // Even when every play attempt fails, the state machine advances
        // and the flags flip exactly as with working audio.
        let mut c = controller();
        c.tap(Tap::Gift);
        assert!(c.flags().audio_enabled);
        run_until(&mut c, 5.0, |c| c.scene() == Scene::Entrance)
            .expect("silence stalled the experience");
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("a quick brown fox jumps over the lazy dog", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "a quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn wrap_handles_long_words() {
        let lines = wrap("congratulations!", 5);
        assert_eq!(lines, vec!["congratulations!"]);
    }

    #[test]
    fn framed_sprite_pads_to_the_widest_line() {
        let sprite = framed_sprite(&["hi".into(), "there".into()], Style::default());
        assert_eq!(sprite.lines.len(), 4);
        let widths: Vec<usize> = sprite.lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn scene_hints_cover_every_scene() {
        for scene in [
            Scene::Gift,
            Scene::Entrance,
            Scene::CakeArrival,
            Scene::CakeCut,
            Scene::Message,
            Scene::Finale,
        ] {
            assert!(!scene.hint().is_empty());
        }
    }
}
