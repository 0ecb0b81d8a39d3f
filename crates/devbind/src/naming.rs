// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Display-name flavors.
//!
//! Description files name everything with space separated words
//! ("Get Max Charging Current"). Backends pick the flavor matching their
//! identifier convention. Word casing inside a word is preserved, so acronyms
//! survive ("CP PWM Duty Cycle" -> `CPPWMDutyCycle`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A space separated display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(display: impl Into<String>) -> Self {
        let display: String = display.into();
        Self(display.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// The name as written in the description.
    pub fn space(&self) -> &str {
        &self.0
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|w| !w.is_empty())
    }

    /// `GetMaxChargingCurrent`
    pub fn camel(&self) -> String {
        self.words().map(capitalize).collect()
    }

    /// `getMaxChargingCurrent`
    pub fn headless(&self) -> String {
        let mut words = self.words();
        let mut out = words.next().map(str::to_lowercase).unwrap_or_default();
        for word in words {
            out.push_str(&capitalize(word));
        }
        out
    }

    /// `GET_MAX_CHARGING_CURRENT`
    pub fn upper(&self) -> String {
        self.words()
            .map(str::to_uppercase)
            .collect::<Vec<_>>()
            .join("_")
    }

    /// `get_max_charging_current`
    pub fn under(&self) -> String {
        self.words()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_")
    }

    /// `get-max-charging-current`
    pub fn dash(&self) -> String {
        self.words()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Append a word (used for derived names like "<callback> Callback").
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Name {
        Name::new(format!("{} {}", self.0, suffix))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every word is ASCII alphanumeric and the name starts with a letter.
    pub fn is_identifier_safe(&self) -> bool {
        self.0.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && self.words().all(|w| w.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavors() {
        let name = Name::new("Get Max Charging Current");
        assert_eq!(name.camel(), "GetMaxChargingCurrent");
        assert_eq!(name.headless(), "getMaxChargingCurrent");
        assert_eq!(name.upper(), "GET_MAX_CHARGING_CURRENT");
        assert_eq!(name.under(), "get_max_charging_current");
        assert_eq!(name.dash(), "get-max-charging-current");
    }

    #[test]
    fn test_acronyms_preserved() {
        let name = Name::new("CP PWM Duty Cycle");
        assert_eq!(name.camel(), "CPPWMDutyCycle");
        assert_eq!(name.headless(), "cpPWMDutyCycle");

        let name = Name::new("IEC61851 State");
        assert_eq!(name.camel(), "IEC61851State");
        assert_eq!(name.headless(), "iec61851State");
        assert_eq!(name.upper(), "IEC61851_STATE");
    }

    #[test]
    fn test_whitespace_normalized() {
        let name = Name::new("  Get   State ");
        assert_eq!(name.space(), "Get State");
        assert_eq!(name.with_suffix("Callback").camel(), "GetStateCallback");
    }

    #[test]
    fn test_identifier_safety() {
        assert!(Name::new("Voltage Diff").is_identifier_safe());
        assert!(!Name::new("6A").is_identifier_safe());
        assert!(!Name::new("PE-CP").is_identifier_safe());
        assert!(!Name::new("").is_identifier_safe());
    }
}
