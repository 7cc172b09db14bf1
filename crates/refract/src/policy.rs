//! Reflection policy: permission flags and the host access hook
//!
//! The policy is an input to driver selection. Privileged driver
//! constructors consult it: the slot driver requires the private-access
//! bits, the hook driver requires an installed [`AccessHook`]. The policy
//! never changes the behavior of an already-constructed driver.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::driver::AccessHook;

/// Reflection permission flags (bitflags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions(u8);

impl Permissions {
    /// No reflection allowed
    pub const NONE: Self = Self(0x00);
    /// Read public fields
    pub const READ_PUBLIC: Self = Self(0x01);
    /// Read private fields
    pub const READ_PRIVATE: Self = Self(0x02);
    /// Write public fields
    pub const WRITE_PUBLIC: Self = Self(0x04);
    /// Write private fields
    pub const WRITE_PRIVATE: Self = Self(0x08);
    /// Invoke public methods
    pub const INVOKE_PUBLIC: Self = Self(0x10);
    /// Invoke private methods
    pub const INVOKE_PRIVATE: Self = Self(0x20);

    /// READ_PUBLIC | READ_PRIVATE
    pub const READ_ALL: Self = Self(0x03);
    /// WRITE_PUBLIC | WRITE_PRIVATE
    pub const WRITE_ALL: Self = Self(0x0C);
    /// INVOKE_PUBLIC | INVOKE_PRIVATE
    pub const INVOKE_ALL: Self = Self(0x30);
    /// READ_PUBLIC | WRITE_PUBLIC | INVOKE_PUBLIC
    pub const PUBLIC_ONLY: Self = Self(0x15);
    /// READ_PRIVATE | WRITE_PRIVATE | INVOKE_PRIVATE — what the slot driver
    /// needs to bypass visibility
    pub const PRIVATE_ACCESS: Self = Self(0x2A);
    /// Everything
    pub const ALL: Self = Self(0x3F);

    /// Create from raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check whether all flags in `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of permissions.
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Intersection of permissions.
    pub const fn intersection(&self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Remove flags.
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    fn parse_token(token: &str) -> Result<Self, ParsePermissionsError> {
        match token.to_uppercase().as_str() {
            "NONE" => Ok(Self::NONE),
            "READ_PUBLIC" => Ok(Self::READ_PUBLIC),
            "READ_PRIVATE" => Ok(Self::READ_PRIVATE),
            "WRITE_PUBLIC" => Ok(Self::WRITE_PUBLIC),
            "WRITE_PRIVATE" => Ok(Self::WRITE_PRIVATE),
            "INVOKE_PUBLIC" => Ok(Self::INVOKE_PUBLIC),
            "INVOKE_PRIVATE" => Ok(Self::INVOKE_PRIVATE),
            "READ_ALL" => Ok(Self::READ_ALL),
            "WRITE_ALL" => Ok(Self::WRITE_ALL),
            "INVOKE_ALL" => Ok(Self::INVOKE_ALL),
            "PUBLIC_ONLY" => Ok(Self::PUBLIC_ONLY),
            "PRIVATE_ACCESS" => Ok(Self::PRIVATE_ACCESS),
            "ALL" => Ok(Self::ALL),
            other => {
                let parsed = if let Some(hex) = other.strip_prefix("0X") {
                    u8::from_str_radix(hex, 16).ok()
                } else {
                    other.parse::<u8>().ok()
                };
                parsed
                    .map(Self::from_bits)
                    .ok_or_else(|| ParsePermissionsError(token.to_string()))
            }
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "NONE",
            Self::READ_PUBLIC => "READ_PUBLIC",
            Self::READ_PRIVATE => "READ_PRIVATE",
            Self::WRITE_PUBLIC => "WRITE_PUBLIC",
            Self::WRITE_PRIVATE => "WRITE_PRIVATE",
            Self::INVOKE_PUBLIC => "INVOKE_PUBLIC",
            Self::INVOKE_PRIVATE => "INVOKE_PRIVATE",
            Self::READ_ALL => "READ_ALL",
            Self::WRITE_ALL => "WRITE_ALL",
            Self::INVOKE_ALL => "INVOKE_ALL",
            Self::PUBLIC_ONLY => "PUBLIC_ONLY",
            Self::PRIVATE_ACCESS => "PRIVATE_ACCESS",
            Self::ALL => "ALL",
            _ => return write!(f, "0x{:02X}", self.0),
        };
        write!(f, "{}", name)
    }
}

/// A permission token could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct ParsePermissionsError(String);

impl FromStr for Permissions {
    type Err = ParsePermissionsError;

    /// Parse pipe-combined flags, e.g. `"READ_PUBLIC|INVOKE_PUBLIC"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            result = result.union(Self::parse_token(part.trim())?);
        }
        Ok(result)
    }
}

impl serde::Serialize for Permissions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Permissions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Policy consulted when constructing privileged drivers.
#[derive(Clone, Default)]
pub struct ReflectPolicy {
    /// Granted permission flags
    pub permissions: Permissions,
    hook: Option<Arc<dyn AccessHook>>,
}

impl ReflectPolicy {
    /// Policy with the given permissions and no hook.
    pub fn new(permissions: Permissions) -> Self {
        Self {
            permissions,
            hook: None,
        }
    }

    /// Install a host access hook.
    pub fn with_hook(mut self, hook: Arc<dyn AccessHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Check whether all the given flags are granted.
    pub fn allows(&self, required: Permissions) -> bool {
        self.permissions.contains(required)
    }

    /// The installed hook, if any.
    pub fn hook(&self) -> Option<&Arc<dyn AccessHook>> {
        self.hook.as_ref()
    }
}

impl fmt::Debug for ReflectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectPolicy")
            .field("permissions", &self.permissions)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
