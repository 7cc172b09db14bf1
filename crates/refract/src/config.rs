//! Configuration input
//!
//! A small serde-friendly struct a host can embed in its own config file
//! (TOML, JSON, ...) to choose the preferred driver and the granted
//! permission set. Changing drivers at runtime means re-running selection
//! through [`Reflector::set_preference`](crate::facade::Reflector::set_preference).

use serde::{Deserialize, Serialize};

use crate::driver::DriverPreference;
use crate::policy::{Permissions, ReflectPolicy};

/// Declarative reflection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectConfig {
    /// Preferred driver (`"slot"`, `"hook"`, or `"standard"`)
    pub preference: DriverPreference,
    /// Granted permission flags, e.g. `"READ_PUBLIC|INVOKE_PUBLIC"` or `"ALL"`
    pub permissions: Permissions,
}

impl ReflectConfig {
    /// Build the policy this configuration describes. Hooks cannot come
    /// from configuration; install one with
    /// [`ReflectPolicy::with_hook`](crate::policy::ReflectPolicy::with_hook).
    pub fn policy(&self) -> ReflectPolicy {
        ReflectPolicy::new(self.permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReflectConfig::default();
        assert_eq!(config.preference, DriverPreference::Standard);
        assert_eq!(config.permissions, Permissions::ALL);
    }

    #[test]
    fn test_deserialize() {
        let config: ReflectConfig = serde_json::from_str(
            r#"{ "preference": "slot", "permissions": "READ_PUBLIC|INVOKE_PUBLIC" }"#,
        )
        .unwrap();
        assert_eq!(config.preference, DriverPreference::Slot);
        assert!(config.permissions.contains(Permissions::READ_PUBLIC));
        assert!(!config.permissions.contains(Permissions::READ_PRIVATE));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ReflectConfig = serde_json::from_str(r#"{ "preference": "hook" }"#).unwrap();
        assert_eq!(config.preference, DriverPreference::Hook);
        assert_eq!(config.permissions, Permissions::ALL);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = ReflectConfig {
            preference: DriverPreference::Slot,
            permissions: Permissions::PUBLIC_ONLY,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ReflectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
