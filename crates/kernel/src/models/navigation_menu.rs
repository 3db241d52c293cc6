//! Navigation menu model.
//!
//! A navigation menu is a named collection of menu items rendered at one
//! page location (header, footer or sidebar).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Page location a menu is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    Header,
    Footer,
    Sidebar,
}

impl MenuLocation {
    /// Stored (lowercase) form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Sidebar => "sidebar",
        }
    }
}

impl fmt::Display for MenuLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known menu location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown menu location '{0}' (expected header, footer or sidebar)")]
pub struct UnknownLocation(pub String);

impl FromStr for MenuLocation {
    type Err = UnknownLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "footer" => Ok(Self::Footer),
            "sidebar" => Ok(Self::Sidebar),
            _ => Err(UnknownLocation(s.to_string())),
        }
    }
}

impl TryFrom<String> for MenuLocation {
    type Error = UnknownLocation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Navigation menu record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NavigationMenu {
    /// Serial identifier.
    pub id: i32,

    /// Display name (e.g., "Main Menu").
    pub name: String,

    /// Placement on the page.
    #[sqlx(try_from = "String")]
    pub location: MenuLocation,

    /// Whether the menu is rendered.
    pub is_active: bool,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a menu.
///
/// Both fields arrive as raw strings so that validation can report a
/// missing or unknown location as a client error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMenu {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

/// Validated input handed to storage.
#[derive(Debug, Clone)]
pub struct NewMenu {
    pub name: String,
    pub location: MenuLocation,
}

/// Input for updating a menu. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenu {
    pub name: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

/// Validated partial update handed to storage.
#[derive(Debug, Clone, Default)]
pub struct MenuChanges {
    pub name: Option<String>,
    pub location: Option<MenuLocation>,
    pub is_active: Option<bool>,
}
