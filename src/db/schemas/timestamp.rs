//! Dual-format timestamp serialization
//!
//! MongoDB needs BSON dates so `$gte` range queries compare chronologically,
//! while the JSON API speaks RFC 3339 strings. The BSON (raw) serializer is
//! not human-readable and serde_json is, which is what selects the format.
//!
//! Use with `#[serde(with = "timestamp")]` on `DateTime<Utc>` fields.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Current time truncated to the millisecond precision BSON dates keep
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if serializer.is_human_readable() {
        value.serialize(serializer)
    } else {
        bson::DateTime::from_chrono(*value).serialize(serializer)
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    if deserializer.is_human_readable() {
        DateTime::<Utc>::deserialize(deserializer)
    } else {
        bson::DateTime::deserialize(deserializer).map(|dt| dt.to_chrono())
    }
}
