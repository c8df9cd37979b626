//! Serde helpers shared by the domain configs
//!
//! Durations appear in config as bare integers; which unit depends on the
//! field, so each field picks one of these `with`-modules explicitly.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// `Duration` as whole seconds
pub mod serde_duration {
    use super::*;

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(de)?))
    }
}

/// `Option<Duration>` as whole seconds, absent when `None`
pub mod serde_duration_option {
    use super::*;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, ser: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => ser.serialize_some(&d.as_secs()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(de)?.map(Duration::from_secs))
    }
}

/// `Duration` as whole milliseconds, for the fields where seconds are too
/// coarse (poll intervals)
pub mod serde_duration_ms {
    use super::*;

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(de)?))
    }
}

pub fn default_true() -> bool {
    true
}
