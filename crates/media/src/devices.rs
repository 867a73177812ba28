//! Device descriptors returned by capture-backend enumeration.
//!
//! These are pure query results; the lists print as JSON arrays from the
//! CLI's `list-*` sub-commands.

use serde::{Deserialize, Serialize};

/// A rectangle in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A display that can be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub frame: Frame,
    /// Whether this is the primary display (the `"main"` sentinel
    /// resolves to it).
    #[serde(default)]
    pub primary: bool,
}

/// A window that can be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: String,
    pub title: Option<String>,
    pub app_name: Option<String>,
    pub app_bundle_id: Option<String>,
    pub is_active: bool,
    pub is_on_screen: bool,
    pub layer: i32,
    pub frame: Frame,
}

/// An audio input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
}

/// An external device (e.g. an attached phone or tablet) whose screen
/// and audio can be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDevice {
    pub id: String,
    pub name: String,
}
