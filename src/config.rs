//! Engine configuration resource.
//!
//! Manages runtime settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_timestep = 0.0166667
//! max_frame_time = 0.25
//! stall_threshold = 0.1
//!
//! [engine]
//! target_fps = 120
//! ```

use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const DEFAULT_MAX_FRAME_TIME: f32 = 0.25;
const DEFAULT_STALL_THRESHOLD: f32 = 0.1;
const DEFAULT_TARGET_FPS: u32 = 120;
const DEFAULT_CONFIG_PATH: &str = "./engine.ini";

/// Engine configuration resource.
///
/// Stores simulation timing and host pacing settings. Missing or invalid
/// values in the file keep their defaults; the loop invariants require all
/// three timing values to be strictly positive.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Simulated seconds consumed by one fixed step.
    pub fixed_timestep: f32,
    /// Per-tick cap on accumulated frame time, in seconds.
    pub max_frame_time: f32,
    /// Gap in seconds after which the frame channel counts as stalled.
    pub stall_threshold: f32,
    /// Target frames per second for the host driver.
    pub target_fps: u32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            max_frame_time: DEFAULT_MAX_FRAME_TIME,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
            target_fps: DEFAULT_TARGET_FPS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [simulation] section
        if let Some(v) = config.getfloat("simulation", "fixed_timestep").ok().flatten() {
            self.set_fixed_timestep(v as f32);
        }
        if let Some(v) = config.getfloat("simulation", "max_frame_time").ok().flatten() {
            self.set_max_frame_time(v as f32);
        }
        if let Some(v) = config
            .getfloat("simulation", "stall_threshold")
            .ok()
            .flatten()
        {
            self.set_stall_threshold(v as f32);
        }

        // [engine] section
        if let Some(fps) = config.getuint("engine", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }

        info!(
            "Loaded config: timestep={}s, max_frame_time={}s, stall_threshold={}s, target_fps={}",
            self.fixed_timestep, self.max_frame_time, self.stall_threshold, self.target_fps
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [simulation] section
        config.set(
            "simulation",
            "fixed_timestep",
            Some(self.fixed_timestep.to_string()),
        );
        config.set(
            "simulation",
            "max_frame_time",
            Some(self.max_frame_time.to_string()),
        );
        config.set(
            "simulation",
            "stall_threshold",
            Some(self.stall_threshold.to_string()),
        );

        // [engine] section
        config.set("engine", "target_fps", Some(self.target_fps.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Set the fixed timestep; non-positive values are rejected.
    pub fn set_fixed_timestep(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.fixed_timestep = seconds;
        } else {
            warn!("ignoring non-positive fixed_timestep {}", seconds);
        }
    }

    /// Set the frame-time cap; non-positive values are rejected.
    pub fn set_max_frame_time(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.max_frame_time = seconds;
        } else {
            warn!("ignoring non-positive max_frame_time {}", seconds);
        }
    }

    /// Set the stall threshold; non-positive values are rejected.
    pub fn set_stall_threshold(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.stall_threshold = seconds;
        } else {
            warn!("ignoring non-positive stall_threshold {}", seconds);
        }
    }
}
