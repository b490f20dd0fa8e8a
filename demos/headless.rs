//! Headless boilerplate example — drives the whole experience on a fixed
//! clock and prints what happens, without ever touching the terminal.
//!
//! Run with: cargo run --example headless

use ascii_celebration::{
    audio::SilentAudio,
    config::Greeting,
    engine::scenes::{Scene, SceneController},
    renderer::Renderer,
    types::{Tap, Viewport},
};

fn main() -> anyhow::Result<()> {
    let viewport = Viewport::new(80, 24);
    let mut controller = SceneController::new(
        Box::new(SilentAudio),
        Greeting::default(),
        viewport,
        true,
    );

    // A scripted viewer: tap whenever the scene has something to tap, and
    // let the timed transitions do the rest.
    let mut last_scene = controller.scene();
    let mut clock = 0.0;
    let mut cuts_requested = 0;
    println!("{clock:6.2}s  {:?}", last_scene);

    while clock < 40.0 {
        controller.update(0.033);
        clock += 0.033;

        let scene = controller.scene();
        if scene != last_scene {
            println!("{clock:6.2}s  {scene:?}");
            last_scene = scene;
            if scene == Scene::Finale {
                break;
            }
        }

        match scene {
            Scene::Gift if clock < 0.1 => {}
            Scene::Gift if clock < 0.2 => controller.tap(Tap::Gift),
            Scene::Entrance if clock > 6.0 => controller.tap(Tap::Advance),
            Scene::CakeCut if cuts_requested < 3 && controller.cut_signals() == cuts_requested => {
                controller.tap(Tap::Cake);
                cuts_requested += 1;
            }
            _ => {}
        }
    }

    // One rasterized frame, as the terminal player would paint it.
    let grid = Renderer::rasterize(controller.stage(), viewport);
    println!();
    for row in &grid {
        let line: String = row.iter().map(|c| c.ch).collect();
        println!("{}", line.trim_end());
    }

    println!();
    println!(
        "cuts: {}  flags: {:?}",
        controller.cut_signals(),
        controller.flags(),
    );
    Ok(())
}
