//! Driver selection and fallback
//!
//! Selection evaluates an ordered list of fallible constructors and
//! terminates at the standard driver, which cannot fail. A privileged
//! constructor that errors is reported through `log::warn!` and skipped;
//! construction failures never propagate to the caller. Only the
//! explicitly preferred privileged driver is attempted — a failed hook
//! preference does not retry the slot driver.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::driver::{HookDriver, ReflectionDriver, SlotDriver, StandardDriver};
use crate::error::DriverInitError;
use crate::policy::ReflectPolicy;

/// Which driver to prefer when running selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverPreference {
    /// Prefer the visibility-bypassing slot driver
    Slot,
    /// Prefer the host-hook driver
    Hook,
    /// Use the standard driver directly
    #[default]
    Standard,
}

impl fmt::Display for DriverPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverPreference::Slot => write!(f, "slot"),
            DriverPreference::Hook => write!(f, "hook"),
            DriverPreference::Standard => write!(f, "standard"),
        }
    }
}

/// A driver preference string could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("unknown driver preference: {0} (expected slot, hook, or standard)")]
pub struct ParsePreferenceError(String);

impl FromStr for DriverPreference {
    type Err = ParsePreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slot" => Ok(DriverPreference::Slot),
            "hook" => Ok(DriverPreference::Hook),
            "standard" => Ok(DriverPreference::Standard),
            other => Err(ParsePreferenceError(other.to_string())),
        }
    }
}

type Constructor<'a> = (
    &'static str,
    Box<dyn Fn() -> Result<Arc<dyn ReflectionDriver>, DriverInitError> + 'a>,
);

/// Run driver selection. Always returns a usable driver.
pub fn select_driver(
    preference: DriverPreference,
    policy: &ReflectPolicy,
) -> Arc<dyn ReflectionDriver> {
    let attempts: Vec<Constructor<'_>> = match preference {
        DriverPreference::Slot => vec![(
            "slot",
            Box::new(|| Ok(Arc::new(SlotDriver::new(policy)?) as Arc<dyn ReflectionDriver>)),
        )],
        DriverPreference::Hook => vec![(
            "hook",
            Box::new(|| Ok(Arc::new(HookDriver::new(policy)?) as Arc<dyn ReflectionDriver>)),
        )],
        DriverPreference::Standard => Vec::new(),
    };

    for (name, construct) in attempts {
        match construct() {
            Ok(driver) => {
                log::debug!("installed {} reflection driver", name);
                return driver;
            }
            Err(err) => {
                log::warn!(
                    "could not load {} reflection driver: {}; falling back to standard",
                    name,
                    err
                );
            }
        }
    }

    log::debug!("installed standard reflection driver");
    Arc::new(StandardDriver::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Permissions;

    #[test]
    fn test_standard_preference() {
        let driver = select_driver(DriverPreference::Standard, &ReflectPolicy::default());
        assert_eq!(driver.name(), "standard");
    }

    #[test]
    fn test_slot_preference_with_grant() {
        let driver = select_driver(DriverPreference::Slot, &ReflectPolicy::default());
        assert_eq!(driver.name(), "slot");
    }

    #[test]
    fn test_slot_preference_falls_back_without_grant() {
        let policy = ReflectPolicy::new(Permissions::PUBLIC_ONLY);
        let driver = select_driver(DriverPreference::Slot, &policy);
        assert_eq!(driver.name(), "standard");
    }

    #[test]
    fn test_hook_preference_falls_back_without_hook() {
        let driver = select_driver(DriverPreference::Hook, &ReflectPolicy::default());
        assert_eq!(driver.name(), "standard");
    }

    #[test]
    fn test_preference_parsing() {
        assert_eq!(
            " Slot ".parse::<DriverPreference>().unwrap(),
            DriverPreference::Slot
        );
        assert_eq!(
            "standard".parse::<DriverPreference>().unwrap(),
            DriverPreference::Standard
        );
        assert!("direct".parse::<DriverPreference>().is_err());
    }

    #[test]
    fn test_selection_idempotent() {
        let policy = ReflectPolicy::default();
        let a = select_driver(DriverPreference::Slot, &policy);
        let b = select_driver(DriverPreference::Slot, &policy);
        assert_eq!(a.name(), b.name());
    }
}
