//! Application configuration.
//!
//! Values come from built-in defaults (the reference constants), then an
//! optional TOML file, then command-line overrides applied in `main.rs`.
//!
//! ```toml
//! [window]
//! width = 900
//! height = 750
//! fps = 60
//!
//! [tree]
//! size = 200.0
//! decay = 0.65
//! max_depth = 10
//!
//! [input]
//! mode = "camera"
//! camera_index = 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use fractal_tree::{InputMapper, Point, TreeError, TreeParams};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path:   PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid tree settings: {0}")]
    Tree(#[from] TreeError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// Where the pointer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Mouse position inside the tree window.
    Mouse,
    /// Hand detection on a live webcam (feature `camera`).
    Camera,
    /// Hand detection on a directory of recorded frames.
    Replay,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width:        usize,
    pub height:       usize,
    pub fps:          u32,
    pub title:        String,
    /// 0xRRGGBB
    pub background:   u32,
    /// 0xRRGGBB
    pub branch_color: u32,
    pub hud:          bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width:        900,
            height:       750,
            fps:          60,
            title:        "Hand Controlled Fractal Tree".to_string(),
            background:   0x202020,
            branch_color: 0xFFFFFF,
            hud:          true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    pub size:        f64,
    pub decay:       f64,
    pub max_depth:   u32,
    /// Distance from the bottom edge of the window to the tree origin.
    pub base_offset: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            size:        200.0,
            decay:       0.65,
            max_depth:   fractal_tree::DEFAULT_MAX_DEPTH,
            base_offset: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub max_tilt_deg: f64,
    pub max_bias_deg: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            max_tilt_deg: fractal_tree::mapper::MAX_TILT_DEG,
            max_bias_deg: fractal_tree::mapper::MAX_BIAS_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub mode:           InputMode,
    pub camera_index:   u32,
    pub replay_dir:     Option<PathBuf>,
    /// Show the captured frames in a second window.
    pub preview:        bool,
    pub mirror_preview: bool,
    /// Skin samples needed before a hand counts as detected.
    pub min_pixels:     usize,
    /// Sample every `stride`-th pixel in both directions.
    pub stride:         usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            mode:           InputMode::Mouse,
            camera_index:   0,
            replay_dir:     None,
            preview:        true,
            mirror_preview: true,
            min_pixels:     400,
            stride:         2,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub window:  WindowConfig,
    pub tree:    TreeConfig,
    pub mapping: MappingConfig,
    pub input:   InputConfig,
}

impl AppConfig {
    /// `<config dir>/hand_tree/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("hand_tree").join("config.toml"))
    }

    /// Load from `explicit` if given (it must exist), otherwise from the
    /// default path when that file exists, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded configuration from {}", path.display());
        Ok(cfg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The tree origin: horizontally centered, `base_offset` above the bottom.
    pub fn origin(&self) -> Point {
        Point::new(
            (self.window.width / 2) as f64,
            self.window.height as f64 - self.tree.base_offset,
        )
    }

    /// Fixed tree parameters; tilt and bias are filled in per frame.
    pub fn tree_params(&self) -> Result<TreeParams, TreeError> {
        TreeParams::new(self.origin(), self.tree.size, self.tree.decay, self.tree.max_depth)
    }

    /// Mapper for a pointer source whose frames are `width`×`height`.
    pub fn mapper(&self, width: u32, height: u32) -> InputMapper {
        InputMapper::new(width, height)
            .with_ranges(self.mapping.max_tilt_deg, self.mapping.max_bias_deg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.window;
        if w.width == 0 || w.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window must be non-empty, got {}x{}", w.width, w.height
            )));
        }
        if w.width > u32::MAX as usize || w.height > u32::MAX as usize {
            return Err(ConfigError::Invalid("window dimensions are too large".into()));
        }
        if w.fps == 0 {
            return Err(ConfigError::Invalid("fps must be at least 1".into()));
        }
        if !self.tree.base_offset.is_finite() {
            return Err(ConfigError::Invalid("tree.base_offset must be finite".into()));
        }
        let m = &self.mapping;
        if !(m.max_tilt_deg.is_finite() && m.max_bias_deg.is_finite()) {
            return Err(ConfigError::Invalid("mapping ranges must be finite".into()));
        }
        if self.input.stride == 0 {
            return Err(ConfigError::Invalid("input.stride must be at least 1".into()));
        }
        if self.input.mode == InputMode::Replay && self.input.replay_dir.is_none() {
            return Err(ConfigError::Invalid("replay mode needs input.replay_dir".into()));
        }
        self.tree_params()?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let cfg = AppConfig::default();
        assert_eq!((cfg.window.width, cfg.window.height), (900, 750));
        assert_eq!(cfg.window.fps, 60);
        assert_eq!(cfg.origin(), Point::new(450.0, 550.0));
        let p = cfg.tree_params().unwrap();
        assert_eq!(p.size(), 200.0);
        assert_eq!(p.decay(), 0.65);
        assert_eq!(p.max_depth(), 10);
        assert_eq!(cfg.input.mode, InputMode::Mouse);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let cfg = AppConfig::from_toml_str(
            "[tree]\ndecay = 0.5\n\n[input]\nmode = \"camera\"\ncamera_index = 2\n",
        )
        .unwrap();
        assert_eq!(cfg.tree.decay, 0.5);
        assert_eq!(cfg.tree.size, 200.0);
        assert_eq!(cfg.input.mode, InputMode::Camera);
        assert_eq!(cfg.input.camera_index, 2);
        assert_eq!(cfg.window, WindowConfig::default());
    }

    #[test]
    fn hex_colors_parse() {
        let cfg = AppConfig::from_toml_str("[window]\nbackground = 0x101820\n").unwrap();
        assert_eq!(cfg.window.background, 0x101820);
    }

    #[test]
    fn unknown_keys_and_modes_rejected() {
        assert!(AppConfig::from_toml_str("[tree]\ndecya = 0.5\n").is_err());
        assert!(AppConfig::from_toml_str("[input]\nmode = \"kinect\"\n").is_err());
    }

    #[test]
    fn invalid_decay_fails_validation() {
        let mut cfg = AppConfig::default();
        cfg.tree.decay = 1.2;
        assert!(matches!(cfg.validate(), Err(ConfigError::Tree(TreeError::DecayOutOfRange(_)))));
    }

    #[test]
    fn replay_needs_a_directory() {
        let mut cfg = AppConfig::default();
        cfg.input.mode = InputMode::Replay;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        cfg.input.replay_dir = Some(PathBuf::from("frames"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_stride_and_fps_rejected() {
        let mut cfg = AppConfig::default();
        cfg.input.stride = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = AppConfig::default();
        cfg.window.fps = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let path = std::env::temp_dir()
            .join(format!("hand_tree_cfg_{}.toml", std::process::id()));
        fs::write(&path, "[window]\nwidth = 640\nheight = 480\n").unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg.origin(), Point::new(320.0, 280.0));
    }

    #[test]
    fn load_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("hand_tree_definitely_missing.toml");
        assert!(matches!(AppConfig::load(Some(&path)), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn mapper_uses_configured_ranges() {
        let mut cfg = AppConfig::default();
        cfg.mapping.max_tilt_deg = 60.0;
        let m = cfg.mapper(600, 400);
        let a = m.angles(Point::new(600.0, 0.0));
        assert!((a.tilt_degrees() - 60.0).abs() < 1e-9);
        assert_eq!(a.bias, 0.0);
    }
}
