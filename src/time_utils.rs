// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting and lenient timestamp decoding.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Lenient timestamp field: documents written by older app builds carry either
/// an RFC3339 string or raw epoch seconds, so reads probe both shapes.
pub mod flexible_time {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        decode_timestamp(deserializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Rfc3339(String),
    EpochSeconds(i64),
}

fn decode_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Rfc3339(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid RFC3339 timestamp: {e}"))),
        RawTimestamp::EpochSeconds(secs) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("epoch seconds out of range: {secs}"))),
    }
}
