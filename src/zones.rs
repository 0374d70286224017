use chrono::{DateTime, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

pub const LOCAL_ZONE_ID: &str = "local";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TimeZoneSpec {
    pub label: &'static str,
    pub zone_id: &'static str,
}

pub const TIME_ZONES: [TimeZoneSpec; 8] = [
    TimeZoneSpec {
        label: "Local Time",
        zone_id: LOCAL_ZONE_ID,
    },
    TimeZoneSpec {
        label: "UTC (Coordinated Universal Time)",
        zone_id: "UTC",
    },
    TimeZoneSpec {
        label: "New York (EST/EDT)",
        zone_id: "America/New_York",
    },
    TimeZoneSpec {
        label: "London (GMT/BST)",
        zone_id: "Europe/London",
    },
    TimeZoneSpec {
        label: "Tokyo (JST)",
        zone_id: "Asia/Tokyo",
    },
    TimeZoneSpec {
        label: "New Delhi (IST)",
        zone_id: "Asia/Kolkata",
    },
    TimeZoneSpec {
        label: "Sydney (AEST/AEDT)",
        zone_id: "Australia/Sydney",
    },
    TimeZoneSpec {
        label: "Berlin (CET/CEST)",
        zone_id: "Europe/Berlin",
    },
];

impl TimeZoneSpec {
    pub fn is_local(&self) -> bool {
        self.zone_id == LOCAL_ZONE_ID
    }

    /// Wall-clock reading of `now` in this zone.
    pub fn wall_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        if self.is_local() {
            return now.with_timezone(&Local).naive_local();
        }
        match self.zone_id.parse::<Tz>() {
            Ok(tz) => now.with_timezone(&tz).naive_local(),
            Err(err) => {
                warn!(zone = self.zone_id, %err, "unknown IANA zone, rendering local time");
                now.with_timezone(&Local).naive_local()
            }
        }
    }
}

pub fn local_zone() -> &'static TimeZoneSpec {
    &TIME_ZONES[0]
}

pub fn find_zone(zone_id: &str) -> Option<&'static TimeZoneSpec> {
    TIME_ZONES.iter().find(|zone| zone.zone_id == zone_id)
}

pub struct ZoneSelection {
    pub zone: &'static TimeZoneSpec,
    pub fallback_reason: Option<String>,
}

/// Resolves a zone id against the fixed list, falling back to local time.
pub fn resolve_zone(zone_id: &str) -> ZoneSelection {
    match find_zone(zone_id.trim()) {
        Some(zone) => ZoneSelection {
            zone,
            fallback_reason: None,
        },
        None => ZoneSelection {
            zone: local_zone(),
            fallback_reason: Some(format!(
                "time zone '{zone_id}' is not supported, using {}",
                local_zone().label
            )),
        },
    }
}
