//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Configuration file locations
pub mod config {
    /// Directory under the user's config dir holding all files
    pub const APP_DIR: &str = "page-hotkeys";

    /// Binding table (the packaged resource in the browser build)
    pub const MAPPINGS_FILENAME: &str = "mappings.json";

    /// Engine settings (match policy, toggle keys, notifications)
    pub const SETTINGS_FILENAME: &str = "settings.json";

    /// Durable key-value store used by the native host for the run flag
    pub const STATE_FILENAME: &str = "state.json";
}

/// Run/pause control gesture
pub mod toggle {
    /// Character that resumes dispatch while paused (typed with Shift)
    pub const RESUME_CHAR: char = '~';

    /// Whether the resume character must be typed with Shift
    pub const RESUME_SHIFT: bool = true;

    /// DOM key name that pauses dispatch while running
    pub const PAUSE_KEY: &str = "Escape";
}

/// Persisted state keys
pub mod storage {
    /// Storage entry holding the JSON-encoded run flag
    pub const RUN_STATE_KEY: &str = "page-hotkeys.running";
}

/// Notification defaults
pub mod notification {
    pub const TITLE: &str = "Page Hotkeys";

    /// Where the toast widget should place the message
    pub const LOCATION: &str = "top-right";

    pub const PAUSED_MESSAGE: &str = "Hotkeys paused";
    pub const RESUMED_MESSAGE: &str = "Hotkeys resumed";
}

/// DOM event names used by the web host
pub mod events {
    /// Key-release event the listener registers for
    pub const KEY_RELEASE: &str = "keyup";

    /// CustomEvent dispatched on the document for the external toast widget
    pub const NOTIFY: &str = "page-hotkeys:notify";
}
