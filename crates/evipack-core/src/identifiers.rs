//! Validated identifier newtypes used across container metadata.
//!
//! Session ids and workflow names end up in manifest fields and container
//! filenames, so they are validated once at the boundary and carried as
//! types instead of being re-checked downstream. There is no unvalidated
//! constructor; [`parse`](SessionId::parse) is the only way in.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::ValidationError;

macro_rules! identifier {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            fn pattern() -> &'static Regex {
                static PATTERN: OnceLock<Regex> = OnceLock::new();
                PATTERN.get_or_init(|| Regex::new($pattern).expect("invalid identifier pattern"))
            }

            /// Parses and validates an identifier.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if Self::pattern().is_match(&value) {
                    Ok(Self(value))
                } else {
                    Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value,
                    })
                }
            }

            /// The validated string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    SessionId,
    "Correlation identifier grouping related steps (trace id, session id).",
    r"^[A-Za-z0-9][A-Za-z0-9._:-]{0,127}$"
);
identifier!(
    WorkflowName,
    "Human-meaningful workflow label recorded in the manifest.",
    r"^[A-Za-z0-9][A-Za-z0-9 ._:-]{0,127}$"
);
