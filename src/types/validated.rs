//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for string and numeric config types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error(
        "invalid channel name '{0}': must be non-empty ASCII letters, digits or '_' and not start with a digit"
    )]
    InvalidChannelName(String),

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),
}

/// Macro to generate validated string newtypes.
///
/// Each type gets:
/// - A `new()` constructor that validates
/// - `as_str()` getter
/// - `AsRef<str>`, `Deref`, `Display`, `TryFrom<String>` impls
/// - Serde `Serialize` and `Deserialize` with validation
///
/// # Example
///
/// ```ignore
/// validated_string! {
///     /// A validated label
///     pub struct Label(String) {
///         validation: |s| {
///             if s.is_empty() {
///                 Err(ValidationError::EmptyLabel)
///             } else {
///                 Ok(())
///             }
///         },
///     }
/// }
/// ```
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

validated_string! {
    /// A validated hostname that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use airsense::types::HostName;
    ///
    /// let host = HostName::new("0.0.0.0".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "0.0.0.0");
    ///
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    #[doc(alias = "host")]
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// Name of one sensor channel
    ///
    /// Channel names double as storage table names, so they are restricted to
    /// ASCII identifiers: letters, digits and `_`, not starting with a digit.
    ///
    /// # Examples
    /// ```
    /// use airsense::types::ChannelName;
    ///
    /// let pm = ChannelName::new("PM25".to_string()).unwrap();
    /// assert_eq!(pm.as_str(), "PM25");
    ///
    /// assert!(ChannelName::new("25PM".to_string()).is_err());
    /// assert!(ChannelName::new("Temp; DROP".to_string()).is_err());
    /// ```
    #[doc(alias = "sensor")]
    pub struct ChannelName(String) {
        validation: |s| {
            if is_identifier(&s) {
                Ok(())
            } else {
                Err(ValidationError::InvalidChannelName(s.clone()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_valid() {
        let host = HostName::new("localhost".to_string()).unwrap();
        assert_eq!(host.as_str(), "localhost");
        assert_eq!(host.to_string(), "localhost");
    }

    #[test]
    fn test_hostname_empty_rejected() {
        assert_eq!(
            HostName::new(String::new()).unwrap_err(),
            ValidationError::EmptyHostName
        );
    }

    #[test]
    fn test_channel_name_default_set_valid() {
        for name in ["Temp", "SN1", "SN2", "SN3", "SN4", "PM25"] {
            assert!(ChannelName::new(name.to_string()).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_channel_name_underscore() {
        assert!(ChannelName::new("_raw".to_string()).is_ok());
        assert!(ChannelName::new("no2_ppb".to_string()).is_ok());
    }

    #[test]
    fn test_channel_name_rejects_leading_digit() {
        let err = ChannelName::new("2SN".to_string()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidChannelName("2SN".to_string()));
    }

    #[test]
    fn test_channel_name_rejects_empty() {
        assert!(ChannelName::new(String::new()).is_err());
    }

    #[test]
    fn test_channel_name_rejects_sql_punctuation() {
        for name in ["Temp;", "a b", "x-y", "\"q\"", "PM2.5", "Ünits"] {
            assert!(ChannelName::new(name.to_string()).is_err(), "{name}");
        }
    }

    #[test]
    fn test_channel_name_deref_and_as_ref() {
        let name = ChannelName::new("SN3".to_string()).unwrap();
        assert_eq!(name.len(), 3);
        let s: &str = name.as_ref();
        assert_eq!(s, "SN3");
    }

    #[test]
    fn test_channel_name_from_str() {
        let name: ChannelName = "Temp".parse().unwrap();
        assert_eq!(name.as_str(), "Temp");
    }

    #[test]
    fn test_channel_name_serde_transparent() {
        let name = ChannelName::new("PM25".to_string()).unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"PM25\"");

        let parsed: ChannelName = serde_json::from_str("\"SN1\"").unwrap();
        assert_eq!(parsed.as_str(), "SN1");
    }

    #[test]
    fn test_channel_name_serde_validates() {
        let result: Result<ChannelName, _> = serde_json::from_str("\"1bad\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_try_from_string() {
        assert!(ChannelName::try_from("SN4".to_string()).is_ok());
        assert!(HostName::try_from(" ".to_string()).is_err());
    }
}
