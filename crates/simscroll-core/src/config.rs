use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub target: TargetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Scroll-to-drag translation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Master switch; when off every scroll event terminates the active drag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Drag in the same direction as the scroll delta (macOS "natural" scrolling)
    #[serde(default = "default_true")]
    pub natural_scrolling: bool,
    /// Number of drag increments each scroll delta is divided into
    #[serde(default = "default_steps")]
    pub steps: i64,
    /// Seconds between drag increments
    #[serde(default = "default_stepping_interval")]
    pub stepping_interval_secs: f64,
    /// Seconds without accepted scroll events before the drag is released
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: f64,
    /// Seconds between drag increments once the cursor has left the target
    #[serde(default = "default_drain_interval")]
    pub drain_interval_secs: f64,
    /// Seconds to wait after mouse-up before moving the cursor back
    #[serde(default = "default_snap_back_delay")]
    pub snap_back_delay_secs: f64,
    /// Virtual key code that cancels the active drag (53 = Escape)
    #[serde(default = "default_cancel_key")]
    pub cancel_key: u16,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            natural_scrolling: default_true(),
            steps: default_steps(),
            stepping_interval_secs: default_stepping_interval(),
            inactivity_timeout_secs: default_inactivity_timeout(),
            drain_interval_secs: default_drain_interval(),
            snap_back_delay_secs: default_snap_back_delay(),
            cancel_key: default_cancel_key(),
        }
    }
}

impl ScrollConfig {
    /// Step count, never below 1
    pub fn steps(&self) -> u32 {
        self.steps.clamp(1, u32::MAX as i64) as u32
    }

    pub fn stepping_interval(&self) -> Duration {
        secs_to_duration(self.stepping_interval_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        secs_to_duration(self.inactivity_timeout_secs)
    }

    pub fn drain_interval(&self) -> Duration {
        secs_to_duration(self.drain_interval_secs)
    }

    pub fn snap_back_delay(&self) -> Duration {
        secs_to_duration(self.snap_back_delay_secs)
    }
}

/// The window that receives synthetic drags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Owning application name as reported by the window server
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
    /// Device bezel artwork to exclude from the interactive area
    #[serde(default)]
    pub bezel: BezelInsets,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            owner_name: default_owner_name(),
            bezel: BezelInsets::default(),
        }
    }
}

/// Distances trimmed from each edge of a target window frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BezelInsets {
    #[serde(default = "default_inset_top")]
    pub top: f64,
    #[serde(default = "default_inset_side")]
    pub left: f64,
    #[serde(default = "default_inset_side")]
    pub right: f64,
    #[serde(default = "default_inset_bottom")]
    pub bottom: f64,
}

impl Default for BezelInsets {
    fn default() -> Self {
        Self {
            top: default_inset_top(),
            left: default_inset_side(),
            right: default_inset_side(),
            bottom: default_inset_bottom(),
        }
    }
}

impl BezelInsets {
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        right: 0.0,
        bottom: 0.0,
    };
}

/// Upper bound for any configured duration, keeping deadlines representable
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Negative, NaN and infinite values all collapse to zero; huge values are
/// capped at [`MAX_DURATION`].
fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration.min(MAX_DURATION),
        Err(_) if secs.is_finite() && secs > 0.0 => MAX_DURATION,
        Err(_) => Duration::ZERO,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_steps() -> i64 {
    10
}

fn default_stepping_interval() -> f64 {
    0.015
}

fn default_inactivity_timeout() -> f64 {
    1.0
}

fn default_drain_interval() -> f64 {
    0.001
}

fn default_snap_back_delay() -> f64 {
    0.05
}

fn default_cancel_key() -> u16 {
    53 // kVK_Escape
}

fn default_owner_name() -> String {
    "Simulator".to_string()
}

fn default_inset_top() -> f64 {
    180.0
}

fn default_inset_side() -> f64 {
    20.0
}

fn default_inset_bottom() -> f64 {
    100.0
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/simscroll/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("simscroll")
            .join("config.toml")
    }
}
