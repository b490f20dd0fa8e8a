//! Greeting configuration — the personalized copy of the experience.
//!
//! A small JSON file supplies the recipient's name and the message shown in
//! the penultimate scene. A missing file means the built-in defaults; a
//! malformed file warns and falls back, so a typo never blocks the party.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greeting {
    pub recipient: String,
    /// The speech-bubble line in the entrance scene.
    #[serde(default = "default_bubble")]
    pub bubble_text: String,
    /// Paragraphs of the final message, wrapped by the renderer.
    pub paragraphs: Vec<String>,
    pub signature: String,
}

fn default_bubble() -> String {
    "A bouquet, just for you".into()
}

impl Default for Greeting {
    fn default() -> Self {
        Greeting {
            recipient: "friend".into(),
            bubble_text: default_bubble(),
            paragraphs: vec![
                "May your day arrive wrapped in laughter and leave behind \
                 memories that glow longer than the candles on your cake."
                    .into(),
                "Celebrate loudly or softly, just make it unmistakably yours."
                    .into(),
            ],
            signature: "With love".into(),
        }
    }
}

impl Greeting {
    /// Strict parse, for `check`.
    pub fn from_file(path: &Path) -> Result<Greeting> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Lenient load, for `play`: no path or no file means defaults, a parse
    /// error warns and falls back.
    pub fn load_or_default(path: Option<&Path>) -> Greeting {
        let Some(path) = path else {
            return Greeting::default();
        };
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(greeting) => greeting,
                Err(e) => {
                    eprintln!("Warning: invalid greeting file ({e}), using defaults");
                    Greeting::default()
                }
            },
            Err(_) => Greeting::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_greeting() {
        let json = r#"{
            "recipient": "Ada",
            "paragraphs": ["Happy birthday!"],
            "signature": "Your friends"
        }"#;
        let greeting: Greeting = serde_json::from_str(json).unwrap();
        assert_eq!(greeting.recipient, "Ada");
        assert_eq!(greeting.bubble_text, default_bubble());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let greeting = Greeting::load_or_default(Some(Path::new("/nonexistent/greeting.json")));
        assert_eq!(greeting.recipient, Greeting::default().recipient);
    }
}
