//! Theme names and effective theme resolution
//!
//! A stored theme may be the symbolic `auto`, which resolves against the
//! host's ambient color scheme at the time it is applied.

use crate::config::{COLOR_SCHEME_ENV, EXTENDED_THEMES};
use crate::error::{AppError, Result};
use std::fmt;
use std::str::FromStr;

/// A theme setting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    Auto,
    #[default]
    Light,
    Dark,
    /// One of [`EXTENDED_THEMES`]
    Named(String),
}

impl Theme {
    pub fn as_str(&self) -> &str {
        match self {
            Theme::Auto => "auto",
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Named(name) => name,
        }
    }

    /// Concrete theme to apply, given the ambient color scheme
    pub fn effective(&self, scheme: ColorScheme) -> Theme {
        match self {
            Theme::Auto => match scheme {
                ColorScheme::Dark => Theme::Dark,
                ColorScheme::Light => Theme::Light,
            },
            other => other.clone(),
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "auto" => Ok(Theme::Auto),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other if EXTENDED_THEMES.contains(&other) => Ok(Theme::Named(other.to_string())),
            _ => Err(AppError::InvalidArgument(format!("unknown theme: {}", s))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host color-scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// Source of the ambient color-scheme signal
pub trait ColorSchemeProbe: Send + Sync {
    fn color_scheme(&self) -> ColorScheme;
}

/// Reads the preference from the environment, defaulting to light
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvColorScheme;

impl ColorSchemeProbe for EnvColorScheme {
    fn color_scheme(&self) -> ColorScheme {
        match std::env::var(COLOR_SCHEME_ENV) {
            Ok(value) if value.trim().eq_ignore_ascii_case("dark") => ColorScheme::Dark,
            _ => ColorScheme::Light,
        }
    }
}

/// Always reports the same preference
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedColorScheme(pub ColorScheme);

impl ColorSchemeProbe for FixedColorScheme {
    fn color_scheme(&self) -> ColorScheme {
        self.0
    }
}
