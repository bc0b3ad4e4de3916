//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Editor connection and media defaults.
    pub editor: EditorDefaults,

    /// Default composition policy values.
    pub composition: CompositionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Defaults applied when talking to the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Project frame rate used for timecode display.
    pub fps: f64,

    /// Duration assigned to media whose length cannot be probed, and to stills.
    pub fallback_clip_frames: u64,

    /// Upper bound on a single editor call, in milliseconds.
    pub call_timeout_ms: u64,
}

/// Defaults for timeline composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionDefaults {
    /// Cross-dissolve length between scenes (0 = hard cuts).
    pub transition_frames: u64,

    /// Whether to drop a marker at every scene start.
    pub scene_markers: bool,

    /// Marker color name for scene markers (Purple, Blue, Cyan, Green, Yellow, Orange, Red).
    pub marker_color: String,

    /// Gap inserted between scenes joined by a hard cut.
    pub gap_frames: u64,

    /// How many times a failed project read is retried before composing.
    pub read_retries: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "montage=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorDefaults::default(),
            composition: CompositionDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            fps: 25.0,
            fallback_clip_frames: 125,
            call_timeout_ms: 5_000,
        }
    }
}

impl Default for CompositionDefaults {
    fn default() -> Self {
        Self {
            transition_frames: 13,
            scene_markers: true,
            marker_color: "Purple".to_string(),
            gap_frames: 0,
            read_retries: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EditorDefaults {
    /// Call timeout as a [`std::time::Duration`].
    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.call_timeout_ms)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("montage").join("config.json")
}
