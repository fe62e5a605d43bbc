//! Day-based durations and their serialized forms.
//!
//! Descriptors use [`std::time::Duration`]. The manifest renders retention
//! and cooldown values in whole seconds and lifecycle ages in whole days, the
//! units the provider APIs expect.

use serde::Serializer;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// A duration of `days` whole days.
pub const fn days(days: u64) -> Duration {
    Duration::from_secs(days * SECONDS_PER_DAY)
}

/// Number of whole days in `duration`, rounding down.
pub const fn whole_days(duration: Duration) -> u64 {
    duration.as_secs() / SECONDS_PER_DAY
}

pub fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

pub fn as_optional_seconds<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => serializer.serialize_some(&duration.as_secs()),
        None => serializer.serialize_none(),
    }
}

pub fn as_optional_days<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(duration) => serializer.serialize_some(&whole_days(*duration)),
        None => serializer.serialize_none(),
    }
}

pub fn as_days<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(whole_days(*duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        #[serde(serialize_with = "as_seconds")]
        retention: Duration,
        #[serde(serialize_with = "as_optional_days")]
        expiration: Option<Duration>,
        #[serde(serialize_with = "as_optional_seconds")]
        delay: Option<Duration>,
    }

    #[test]
    fn days_converts_to_seconds() {
        assert_eq!(days(14).as_secs(), 1_209_600);
        assert_eq!(whole_days(days(90)), 90);
        assert_eq!(whole_days(Duration::from_secs(SECONDS_PER_DAY - 1)), 0);
    }

    #[test]
    fn serializes_in_provider_units() {
        let sample = Sample {
            retention: days(14),
            expiration: Some(days(90)),
            delay: None,
        };

        assert_eq!(
            serde_json::to_value(&sample).unwrap(),
            serde_json::json!({ "retention": 1_209_600, "expiration": 90, "delay": null })
        );
    }
}
