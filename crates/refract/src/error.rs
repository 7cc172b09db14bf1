//! Error taxonomy
//!
//! Three layers: `DriverError` for resolution and access failures inside a
//! driver, `DriverInitError` for construction failures consumed by the
//! selection chain (never surfaced to callers), and `ReflectError` for the
//! facade's strict-mode contract, which wraps a driver failure together with
//! the identity of the member being operated on.

use crate::value::TypeTag;

/// Failure raised by a reflection driver while resolving or acting on a
/// member.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The member is absent from the class and its entire ancestor chain
    #[error("member not found")]
    NotFound,

    /// The member was resolved but this driver may not touch it
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The invoked method body itself faulted
    #[error("invocation failed: {0}")]
    Invocation(String),

    /// No class with this name or ID is registered
    #[error("unknown class: {0}")]
    UnknownClass(String),
}

/// Failure to construct a privileged driver. Absorbed by the selection
/// chain and downgraded to a diagnostic; callers never observe it.
#[derive(Debug, thiserror::Error)]
pub enum DriverInitError {
    /// The policy does not grant private-member access
    #[error("policy does not grant private member access")]
    BypassNotGranted,

    /// No host access hook is installed in the policy
    #[error("no access hook installed")]
    NoHookInstalled,
}

/// Failure surfaced by a strict-mode facade operation.
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// A required argument was passed as `None`
    #[error("unexpected null argument: {0}")]
    InvalidArgument(&'static str),

    /// A field read failed
    #[error("can't read field {target}: {source}")]
    FieldRead {
        /// `Class.field` identity
        target: String,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },

    /// A field write failed
    #[error("can't write field {target}: {source}")]
    FieldWrite {
        /// `Class.field` identity
        target: String,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },

    /// A method invocation failed at resolution or execution
    #[error("method {target} could not be invoked: {source}")]
    MethodInvoke {
        /// `Class.method` identity, with the argument type when one was given
        target: String,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },
}

impl ReflectError {
    /// The driver failure behind this error, if there is one.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            ReflectError::InvalidArgument(_) => None,
            ReflectError::FieldRead { source, .. }
            | ReflectError::FieldWrite { source, .. }
            | ReflectError::MethodInvoke { source, .. } => Some(source),
        }
    }
}

/// Render a `Class.member` identity, with an optional argument type.
pub(crate) fn member_identity(class: &str, member: &str, arg: Option<&TypeTag>) -> String {
    match arg {
        Some(tag) => format!("{}.{}({})", class, member, tag),
        None => format!("{}.{}", class, member),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_identity() {
        assert_eq!(member_identity("Point", "x", None), "Point.x");
        assert_eq!(
            member_identity("Calc", "add", Some(&TypeTag::Int)),
            "Calc.add(int)"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ReflectError::FieldRead {
            target: "Point.x".to_string(),
            source: DriverError::NotFound,
        };
        assert_eq!(err.to_string(), "can't read field Point.x: member not found");
        assert!(matches!(err.driver_error(), Some(DriverError::NotFound)));
    }

    #[test]
    fn test_invalid_argument_has_no_source() {
        let err = ReflectError::InvalidArgument("target");
        assert!(err.driver_error().is_none());
    }
}
