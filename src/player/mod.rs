//! Player — the interactive terminal runtime.
//!
//! Owns the terminal session and the frame loop: raw mode, alternate
//! screen, hidden cursor, mouse capture, all restored on every exit path.
//! Each pass polls input with a ~33 ms budget, advances the scene
//! controller by the measured wall-clock delta, and repaints only the
//! cells that changed. The player maps raw events to the engine's tap
//! vocabulary; it never interprets scene semantics itself.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::{cursor, event, execute, queue, style, terminal};

use crate::audio::{AudioAdapter, BellAudio, SilentAudio};
use crate::config::Greeting;
use crate::engine::scenes::{Scene, SceneController};
use crate::renderer::Renderer;
use crate::types::{Cell, Color, NamedColor, Style, Tap, Viewport};

/// Rows reserved above the canvas for the hint bar.
const CANVAS_OFFSET: u16 = 1;
/// Input poll budget per pass, roughly 30 fps.
const FRAME_BUDGET: Duration = Duration::from_millis(33);

/// Below this size the experience is unplayable at all.
const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 12;
/// Below this size (or with `--plain`) widgets mount their fallback
/// tap-target variants instead of the full art.
const RICH_WIDTH: u16 = 60;
const RICH_HEIGHT: u16 = 20;

pub struct Player {
    controller: SceneController,
    viewport: Viewport,
    grid: Vec<Vec<Cell>>,
    hint_scene: Option<Scene>,
}

impl Player {
    /// Size the experience to the current terminal and build the scene
    /// controller. `plain` forces the fallback widgets and silence.
    pub fn new(greeting: Greeting, plain: bool) -> Result<Self> {
        let (term_w, term_h) = terminal::size()?;
        if term_w < MIN_WIDTH || term_h < MIN_HEIGHT {
            bail!(
                "Terminal too small: need at least {}x{}, have {}x{}",
                MIN_WIDTH,
                MIN_HEIGHT,
                term_w,
                term_h,
            );
        }

        let rich = !plain && term_w >= RICH_WIDTH && term_h >= RICH_HEIGHT;
        let viewport = Viewport::new(term_w, term_h - CANVAS_OFFSET);
        let audio: Box<dyn AudioAdapter> = if plain {
            Box::new(SilentAudio)
        } else {
            Box::new(BellAudio::new())
        };

        let w = viewport.width as usize;
        let h = viewport.height as usize;
        Ok(Player {
            controller: SceneController::new(audio, greeting, viewport, rich),
            viewport,
            grid: vec![vec![Cell::default(); w]; h],
            hint_scene: None,
        })
    }

    /// Run the experience until the user quits.
    ///
    /// Sets up the terminal, enters the frame loop, and restores the
    /// terminal on exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(
            stdout,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();

        result
    }

    // -----------------------------------------------------------------------
    // Frame loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.render_hint_bar(stdout)?;
        self.render_full(stdout)?;

        let mut last = Instant::now();
        loop {
            let deadline = Instant::now() + FRAME_BUDGET;
            while event::poll(deadline.saturating_duration_since(Instant::now()))? {
                match event::read()? {
                    event::Event::Key(key) => {
                        use event::KeyCode::*;
                        match key.code {
                            Char('q') | Esc => return Ok(()),
                            Char(' ') | Enter => self.controller.tap(self.active_tap()),
                            _ => {}
                        }
                    }
                    event::Event::Mouse(mouse) => match mouse.kind {
                        event::MouseEventKind::Down(_) => {
                            self.controller.tap(self.active_tap());
                        }
                        event::MouseEventKind::Moved => {
                            self.controller.set_hover(self.over_widget(mouse.column, mouse.row));
                        }
                        _ => {}
                    },
                    event::Event::Resize(_, _) => {
                        self.hint_scene = None;
                        self.render_hint_bar(stdout)?;
                        self.render_full(stdout)?;
                    }
                    _ => {}
                }
            }

            let now = Instant::now();
            // Cap the step so a stalled terminal doesn't teleport the scene.
            let dt = now.duration_since(last).as_secs_f64().min(0.25);
            last = now;
            self.controller.update(dt);
            self.repaint(stdout)?;
        }
    }

    /// The whole surface is the tap target, as in a touch greeting: the
    /// active scene decides what a tap means.
    fn active_tap(&self) -> Tap {
        match self.controller.scene() {
            Scene::Gift => Tap::Gift,
            Scene::CakeCut => Tap::Cake,
            _ => Tap::Advance,
        }
    }

    /// Roughly the central region where the scene's widget sits.
    fn over_widget(&self, column: u16, row: u16) -> bool {
        let x = column as f64;
        let y = row.saturating_sub(CANVAS_OFFSET) as f64;
        (x - self.viewport.center_x()).abs() < self.viewport.width / 4.0
            && (y - self.viewport.center_y()).abs() < self.viewport.height / 4.0
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn repaint(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        if self.hint_scene != Some(self.controller.scene()) {
            self.render_hint_bar(stdout)?;
        }

        let next = Renderer::rasterize(self.controller.stage(), self.viewport);
        let changes = Renderer::diff(&self.grid, &next);
        if changes.is_empty() {
            return Ok(());
        }
        for change in &changes {
            let cs = to_content_style(&change.cell.style);
            queue!(
                stdout,
                cursor::MoveTo(change.x, change.y + CANVAS_OFFSET),
                style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
            )?;
        }
        stdout.flush()?;
        self.grid = next;
        Ok(())
    }

    fn render_full(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.grid = Renderer::rasterize(self.controller.stage(), self.viewport);
        for (y, row) in self.grid.iter().enumerate() {
            queue!(stdout, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
            for cell in row {
                let cs = to_content_style(&cell.style);
                queue!(
                    stdout,
                    style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
                )?;
            }
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_hint_bar(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.hint_scene = Some(self.controller.scene());
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(" "),
        )?;
        print_hint_item(stdout, self.controller.hint())?;
        queue!(stdout, style::Print("  "))?;
        print_hint_item(stdout, "[q][Esc] quit")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Print a hint item, bolding any text inside `[...]` brackets. Text
/// outside brackets is printed dim.
fn print_hint_item(stdout: &mut io::Stdout, item: &str) -> Result<()> {
    let mut rest = item;
    while !rest.is_empty() {
        if let Some(open) = rest.find('[') {
            if open > 0 {
                queue!(
                    stdout,
                    style::SetAttribute(style::Attribute::Dim),
                    style::Print(&rest[..open]),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
            }
            rest = &rest[open..];
            if let Some(close) = rest.find(']') {
                queue!(
                    stdout,
                    style::SetAttribute(style::Attribute::Bold),
                    style::Print(&rest[..=close]),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
                rest = &rest[close + 1..];
            } else {
                queue!(stdout, style::Print(rest))?;
                break;
            }
        } else {
            queue!(
                stdout,
                style::SetAttribute(style::Attribute::Dim),
                style::Print(rest),
                style::SetAttribute(style::Attribute::Reset),
            )?;
            break;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}
