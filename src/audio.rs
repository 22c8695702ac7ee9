//! ==============================================================================
//! audio.rs - localized alert cues and the playback capability
//! ==============================================================================
//!
//! purpose:
//!     maps (level, language) to a cue file and plays it through an external
//!     player (mpg123 by default). playback sits behind the AudioPlayer trait
//!     so the listener can be driven with a recording fake in tests.
//!
//! asset layout (in the configured audio dir):
//!     red_alert.<ext>            spanish_red_alert.<ext>
//!     yellow_alert.<ext>         spanish_yellow_alert.<ext>
//!
//! relationships:
//!     - used by: listener.rs (decides, then calls AudioPlayer::play)
//!
//! ==============================================================================

use crate::domain::AlertLevel;

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::process::Command;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueKind {
    RedAlert,
    YellowAlert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueLanguage {
    English,
    Spanish,
}

impl CueLanguage {
    /// "es" is the only localized variant; everything else falls back to english
    pub fn from_code(code: &str) -> Self {
        if code == "es" {
            CueLanguage::Spanish
        } else {
            CueLanguage::English
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cue {
    pub kind: CueKind,
    pub language: CueLanguage,
}

impl Cue {
    /// GREEN never has a cue
    pub fn for_alert(level: AlertLevel, language: &str) -> Option<Self> {
        let kind = match level {
            AlertLevel::Red => CueKind::RedAlert,
            AlertLevel::Yellow => CueKind::YellowAlert,
            AlertLevel::Green => return None,
        };
        Some(Cue { kind, language: CueLanguage::from_code(language) })
    }

    /// file name without extension, e.g. "spanish_red_alert"
    pub fn stem(&self) -> &'static str {
        match (self.kind, self.language) {
            (CueKind::RedAlert, CueLanguage::English) => "red_alert",
            (CueKind::RedAlert, CueLanguage::Spanish) => "spanish_red_alert",
            (CueKind::YellowAlert, CueLanguage::English) => "yellow_alert",
            (CueKind::YellowAlert, CueLanguage::Spanish) => "spanish_yellow_alert",
        }
    }

    pub fn file_name(&self, ext: &str) -> String {
        format!("{}.{}", self.stem(), ext.trim_start_matches('.'))
    }
}

/// playback capability. blocking; callers offload it.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, cue: &Cue) -> Result<()>;
}

/// plays cue files by spawning an external player and waiting for it
pub struct CommandPlayer {
    player: String,
    audio_dir: PathBuf,
    ext: String,
}

impl CommandPlayer {
    pub fn new(player: impl Into<String>, audio_dir: impl Into<PathBuf>, ext: impl Into<String>) -> Self {
        Self { player: player.into(), audio_dir: audio_dir.into(), ext: ext.into() }
    }

    pub fn cue_path(&self, cue: &Cue) -> PathBuf {
        self.audio_dir.join(cue.file_name(&self.ext))
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, cue: &Cue) -> Result<()> {
        let path = self.cue_path(cue);
        if !path.exists() {
            bail!("cue file missing: {}", path.display());
        }

        tracing::debug!("[AUDIO] {} {}", self.player, path.display());
        let output = Command::new(&self.player)
            .arg(&path)
            .output()
            .map_err(|e| anyhow!("failed to run {}: {}", self.player, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", self.player, output.status, stderr.trim());
        }
        Ok(())
    }
}

/// records every cue instead of playing it
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPlayer {
    played: std::sync::Mutex<Vec<Cue>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingPlayer {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl AudioPlayer for RecordingPlayer {
    fn play(&self, cue: &Cue) -> Result<()> {
        self.played.lock().unwrap().push(*cue);
        if self.fail {
            bail!("speaker unplugged");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn green_is_silent() {
        assert_eq!(Cue::for_alert(AlertLevel::Green, "en"), None);
        assert_eq!(Cue::for_alert(AlertLevel::Green, "es"), None);
    }

    #[test]
    fn cue_file_names() {
        let name = |level, lang| Cue::for_alert(level, lang).unwrap().file_name("mp3");
        assert_eq!(name(AlertLevel::Red, "en"), "red_alert.mp3");
        assert_eq!(name(AlertLevel::Red, "es"), "spanish_red_alert.mp3");
        assert_eq!(name(AlertLevel::Yellow, "en"), "yellow_alert.mp3");
        assert_eq!(name(AlertLevel::Yellow, "es"), "spanish_yellow_alert.mp3");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        for code in ["fr", "", "ES", "es-MX"] {
            let cue = Cue::for_alert(AlertLevel::Red, code).unwrap();
            assert_eq!(cue.language, CueLanguage::English, "code {:?}", code);
        }
    }

    #[test]
    fn extension_dot_is_optional() {
        let cue = Cue::for_alert(AlertLevel::Yellow, "en").unwrap();
        assert_eq!(cue.file_name(".wav"), "yellow_alert.wav");
    }

    #[test]
    fn missing_file_is_an_error() {
        let player = CommandPlayer::new("true", std::env::temp_dir().join("no-such-beacon-dir"), "mp3");
        let cue = Cue::for_alert(AlertLevel::Red, "en").unwrap();
        let err = player.play(&cue).unwrap_err();
        assert!(err.to_string().contains("cue file missing"));
    }

    #[test]
    fn cue_path_joins_dir_and_name() {
        let player = CommandPlayer::new("mpg123", "/home/pi/audio", "mp3");
        let cue = Cue::for_alert(AlertLevel::Yellow, "es").unwrap();
        assert_eq!(player.cue_path(&cue), PathBuf::from("/home/pi/audio/spanish_yellow_alert.mp3"));
    }
}
