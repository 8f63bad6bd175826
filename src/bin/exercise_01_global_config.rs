//! Exercise 01: Global Configuration
//! One configuration instance shared by every module of the system
//!
//! Run with: cargo run --bin exercise_01_global_config

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use colored::Colorize;
use thiserror::Error;

use singleton_patterns::get_instance;

// =============================================================================
// Validated configuration values
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown language code '{code}' (supported: ES, EN)")]
    UnknownLanguage { code: String },

    #[error("UTC offset {hours} is out of range (min: -12, max: +14)")]
    OffsetOutOfRange { hours: i8 },
}

/// Interface language for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Es,
    En,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Es => write!(f, "ES"),
            Language::En => write!(f, "EN"),
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        if code.eq_ignore_ascii_case("es") {
            Ok(Language::Es)
        } else if code.eq_ignore_ascii_case("en") {
            Ok(Language::En)
        } else {
            Err(ConfigError::UnknownLanguage {
                code: code.to_string(),
            })
        }
    }
}

/// Whole-hour UTC offset, validated to the range real time zones use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset(i8);

impl UtcOffset {
    pub fn from_hours(hours: i8) -> Result<Self, ConfigError> {
        if (-12..=14).contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(ConfigError::OffsetOutOfRange { hours })
        }
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UTC{:+}", self.0)
    }
}

// =============================================================================
// The configuration singleton
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct ConfigState {
    language: Language,
    utc_offset: UtcOffset,
}

/// Global system preferences. Every module receives the same instance from
/// the registry; updates through any handle are visible through all of them.
#[derive(Debug)]
pub struct AppConfig {
    state: RwLock<ConfigState>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state: RwLock::new(ConfigState {
                language: Language::Es,
                utc_offset: UtcOffset(-5),
            }),
        }
    }
}

impl AppConfig {
    pub fn language(&self) -> Language {
        self.read().language
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.read().utc_offset
    }

    pub fn set_language(&self, language: Language) {
        self.write().language = language;
    }

    pub fn set_utc_offset(&self, utc_offset: UtcOffset) {
        self.write().utc_offset = utc_offset;
    }

    /// Current values on one line, for the demonstration output.
    pub fn describe(&self) -> String {
        let state = self.read();
        format!(
            "Language: {} | Time zone: {}",
            state.language, state.utc_offset
        )
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ConfigState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ConfigState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Demonstration
// =============================================================================

fn main() {
    println!("=== Exercise 01: Global Configuration ===\n");

    // An "admin module" fetches the configuration and tweaks it.
    let admin_config = get_instance(AppConfig::default);
    println!("Values seen by the admin module:");
    println!("  {}", admin_config.describe());

    println!(
        "\n[!] Switching language {} -> EN and time zone {} -> UTC+12...",
        admin_config.language(),
        admin_config.utc_offset()
    );
    match "EN".parse::<Language>() {
        Ok(language) => admin_config.set_language(language),
        Err(err) => println!("  {}", format!("rejected: {err}").red()),
    }
    match UtcOffset::from_hours(12) {
        Ok(offset) => admin_config.set_utc_offset(offset),
        Err(err) => println!("  {}", format!("rejected: {err}").red()),
    }

    // A "user module" somewhere else fetches "its own" configuration.
    let user_config = get_instance(AppConfig::default);
    println!("\nValues seen by the user module:");
    println!("  {}", user_config.describe());

    // Validation rejects nonsense before it ever reaches the shared state.
    println!("\nTrying to set an impossible offset (UTC+99):");
    match UtcOffset::from_hours(99) {
        Ok(_) => println!("  accepted?!"),
        Err(err) => println!("  {}", format!("rejected: {err}").yellow()),
    }

    // Both handles must point at the same instance in memory.
    println!("\nAre both modules holding the same object?");
    let same_instance = std::sync::Arc::ptr_eq(&admin_config, &user_config);
    println!("Result: {same_instance}");
    if same_instance {
        println!("{}", "✓ The singleton holds: one configuration, shared".green());
    } else {
        println!("{}", "✗ Two different instances were created".red());
    }

    println!("\n=== Key Points ===");
    println!("1. The registry hands every caller a clone of the same Arc");
    println!("2. RwLock gives interior mutability through a shared handle");
    println!("3. Updates through one handle are instantly visible through all");
    println!("4. Smart constructors reject invalid values with typed errors");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_known_codes_in_any_case() {
        assert_eq!("ES".parse::<Language>().unwrap(), Language::Es);
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
    }

    #[test]
    fn language_rejects_unknown_codes() {
        let err = "FR".parse::<Language>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownLanguage {
                code: String::from("FR")
            }
        );
    }

    #[test]
    fn offset_accepts_the_full_real_world_range() {
        assert!(UtcOffset::from_hours(-12).is_ok());
        assert!(UtcOffset::from_hours(0).is_ok());
        assert!(UtcOffset::from_hours(14).is_ok());
        assert!(UtcOffset::from_hours(-13).is_err());
        assert!(UtcOffset::from_hours(15).is_err());
    }

    #[test]
    fn offset_displays_with_explicit_sign() {
        assert_eq!(UtcOffset::from_hours(-5).unwrap().to_string(), "UTC-5");
        assert_eq!(UtcOffset::from_hours(12).unwrap().to_string(), "UTC+12");
        assert_eq!(UtcOffset::from_hours(0).unwrap().to_string(), "UTC+0");
    }

    #[test]
    fn defaults_match_the_initial_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.language(), Language::Es);
        assert_eq!(config.utc_offset(), UtcOffset::from_hours(-5).unwrap());
        assert_eq!(config.describe(), "Language: ES | Time zone: UTC-5");
    }

    #[test]
    fn updates_through_one_handle_are_seen_through_another() {
        let first = std::sync::Arc::new(AppConfig::default());
        let second = std::sync::Arc::clone(&first);

        first.set_language(Language::En);
        first.set_utc_offset(UtcOffset::from_hours(12).unwrap());

        assert_eq!(second.language(), Language::En);
        assert_eq!(second.utc_offset(), UtcOffset::from_hours(12).unwrap());
    }

    #[test]
    fn registry_returns_one_shared_instance() {
        let a = get_instance(AppConfig::default);
        let b = get_instance(AppConfig::default);
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }
}
