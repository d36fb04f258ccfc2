//! Network-related configuration types

use std::num::NonZeroU16;
use std::str::FromStr;

use crate::types::ValidationError;

nonzero_newtype! {
    /// A validated listen port that cannot be zero
    ///
    /// # Examples
    /// ```
    /// use airsense::types::Port;
    ///
    /// let port = Port::new(7070).unwrap();
    /// assert_eq!(port.get(), 7070);
    ///
    /// // Port 0 is invalid
    /// assert!(Port::new(0).is_none());
    /// ```
    #[doc(alias = "tcp_port")]
    pub struct Port(NonZeroU16: u16, serialize as serialize_u16);
}

impl Port {
    /// Default listen port for the RFCOMM/TCP bridge
    pub const DEFAULT: Self = Self(NonZeroU16::new(7070).unwrap());
}

impl Default for Port {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPortNumber(s.to_string()))?;
        Self::new(port).ok_or(ValidationError::InvalidPort)
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidPort)
    }
}
