//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Configuration paths and filenames
pub mod config {
    /// Application directory name under XDG config
    pub const APP_DIR: &str = "waypy";

    /// Configuration filename
    pub const FILENAME: &str = "config.yaml";

    /// Environment variable overriding the application directory
    pub const DIR_ENV: &str = "WAYPY_CONFIG_HOME";

    /// Environment variable holding a full tracing filter directive
    pub const LOG_ENV: &str = "WAYPY_LOG";

    /// Log file written while the interactive picker owns the terminal
    pub const TUI_LOG_FILENAME: &str = "waypy.log";

    /// Profiles root, relative to the application directory
    pub const PROFILES_SUBDIR: &[&str] = &["profiles", "waybar"];

    pub mod backup {
        /// Backups root, relative to the application directory
        pub const SUBDIR: &str = "backups";

        /// chrono format for the timestamp part of a snapshot name
        pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

        /// Suffix appended after the timestamp
        pub const SUFFIX: &str = "_bak";

        /// Separator between the suffix and a same-second sequence number
        pub const SEQUENCE_SEPARATOR: char = '-';
    }
}

/// Waybar file layout
pub mod waybar {
    /// Directory name of the live Waybar configuration under XDG config
    pub const ACTIVE_DIR: &str = "waybar";

    /// Bar configuration filename (shared by profiles and the live directory)
    pub const CONFIG_FILENAME: &str = "config";

    /// Stylesheet filename (shared by profiles and the live directory)
    pub const STYLE_FILENAME: &str = "style.css";
}

/// Process control constants
pub mod process {
    /// Name of the status-bar process as it appears in /proc/PID/comm
    pub const DEFAULT_NAME: &str = "waybar";

    /// Process table root
    pub const PROC_DIR: &str = "/proc";

    /// Environment variable set inside a Hyprland session
    pub const HYPRLAND_SIGNATURE_ENV: &str = "HYPRLAND_INSTANCE_SIGNATURE";

    /// Launcher prefix used when Hyprland is available
    pub const HYPRLAND_EXEC: &[&str] = &["hyprctl", "dispatch", "exec"];

    /// Default reload coordination timeout in seconds
    pub const DEFAULT_RELOAD_TIMEOUT_SECS: f64 = 10.0;

    /// Largest accepted reload timeout in seconds; larger values are clamped
    pub const MAX_RELOAD_TIMEOUT_SECS: f64 = 600.0;

    /// Multiplier applied to the timeout while waiting for the launch signal
    pub const LAUNCH_WAIT_FACTOR: u32 = 2;

    /// How long the terminate task waits for signalled processes to exit
    pub const TERMINATE_GRACE_MS: u64 = 1500;

    /// Poll interval while waiting for signalled processes to exit
    pub const TERMINATE_POLL_MS: u64 = 50;
}

/// Interactive picker constants
pub mod tui {
    /// Input poll interval (also the clock refresh rate)
    pub const TICK_MS: u64 = 250;

    /// Height of the status panel in rows (including borders)
    pub const STATUS_HEIGHT: u16 = 7;
}
