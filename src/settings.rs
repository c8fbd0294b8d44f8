use std::path::{Path, PathBuf};

use crate::io::SaveFormat;
use crate::ops::{DEFAULT_BACKGROUND_THRESHOLD, DEFAULT_MASK_THRESHOLD};

const SETTINGS_FILE: &str = "colorshift_settings.cfg";

/// User defaults that persist across runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Threshold for background replacement when none is given
    pub background_threshold: u8,
    /// Threshold for color masking when none is given
    pub mask_threshold: u8,
    /// Appended to the input file stem when writing next to the input
    pub output_suffix: String,
    /// Output format when neither a flag nor an output extension decides it
    pub default_format: SaveFormat,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Maximum number of undo steps kept by a session
    pub max_undo_steps: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_threshold: DEFAULT_BACKGROUND_THRESHOLD,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            output_suffix: "-Modified".to_string(),
            default_format: SaveFormat::Png,
            jpeg_quality: 90,
            max_undo_steps: 20,
        }
    }
}

impl Settings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/colorshift/colorshift_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\colorshift\colorshift_settings.cfg
    /// On macOS:   ~/Library/Application Support/colorshift/colorshift_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").ok()?;
            return Some(PathBuf::from(appdata).join("colorshift").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("colorshift")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
                _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("colorshift").join(SETTINGS_FILE))
        }
    }

    /// Load settings from disk; missing file or unreadable values fall back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the user's settings file. Returns the written path.
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::settings_path().ok_or("no config directory available")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(path, self.to_config_string())
            .map_err(|e| format!("could not write '{}': {}", path.display(), e))
    }

    /// Parse `key=value` lines. Unknown keys, `#` comments and bad values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else { continue };
            let value = value.trim();
            match key.trim() {
                "background_threshold" => {
                    if let Ok(v) = value.parse() {
                        s.background_threshold = v;
                    }
                }
                "mask_threshold" => {
                    if let Ok(v) = value.parse() {
                        s.mask_threshold = v;
                    }
                }
                "output_suffix" => s.output_suffix = value.to_string(),
                "default_format" => {
                    if let Some(f) = SaveFormat::from_name(value) {
                        s.default_format = f;
                    }
                }
                "jpeg_quality" => {
                    if let Ok(v) = value.parse::<u8>()
                        && (1..=100).contains(&v)
                    {
                        s.jpeg_quality = v;
                    }
                }
                "max_undo_steps" => {
                    if let Ok(v) = value.parse() {
                        s.max_undo_steps = v;
                    }
                }
                _ => {}
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "background_threshold={}\n\
             mask_threshold={}\n\
             output_suffix={}\n\
             default_format={}\n\
             jpeg_quality={}\n\
             max_undo_steps={}\n",
            self.background_threshold,
            self.mask_threshold,
            self.output_suffix,
            self.default_format.name(),
            self.jpeg_quality,
            self.max_undo_steps,
        )
    }
}
