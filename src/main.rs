use std::path::Path;
use std::process;

use anyhow::{bail, Result};

use ascii_celebration::{config::Greeting, player::Player};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "ascii-celebration play [greeting.json] [--plain]";
const CHECK_USAGE: &str = "ascii-celebration check <greeting.json>";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => {
            let mut path = None;
            let mut plain = false;
            for arg in args {
                match arg.as_str() {
                    "--plain" => plain = true,
                    other if path.is_none() && !other.starts_with('-') => {
                        path = Some(other.to_string());
                    }
                    other => bail!("Unexpected argument '{other}'\n\nUsage:\n  {PLAY_USAGE}"),
                }
            }
            play(path.as_deref(), plain)
        }
        Some("check") => {
            let Some(path) = args.next() else {
                bail!(CHECK_USAGE);
            };
            check(&path)
        }
        _ => bail!(
            "ASCII Celebration — an animated birthday greeting for the terminal\n\nUsage:\n  {PLAY_USAGE}\n  {CHECK_USAGE}"
        ),
    }
}

fn play(path: Option<&str>, plain: bool) -> Result<()> {
    let greeting = Greeting::load_or_default(path.map(Path::new));
    let mut player = Player::new(greeting, plain)?;
    player.play()
}

fn check(path: &str) -> Result<()> {
    let greeting = Greeting::from_file(Path::new(path))?;
    eprintln!(
        "{}: greeting for {} with {} paragraph(s), signed \"{}\"",
        path,
        greeting.recipient,
        greeting.paragraphs.len(),
        greeting.signature,
    );
    Ok(())
}
