use chrono::{DateTime, SecondsFormat, Utc};

/// Wall clock that never steps backwards between consecutive reads.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last = Some(next);
        next
    }
}

/// RFC 3339 with microsecond precision, e.g. `2024-03-01T10:15:30.123456Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_non_decreasing() {
        let mut clock = MonotonicClock::new();
        let mut previous = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn test_format_parses_back() {
        let mut clock = MonotonicClock::new();
        let ts = clock.now();
        let raw = format_timestamp(&ts);

        assert!(raw.ends_with('Z'));
        let parsed = parse_timestamp(&raw).unwrap();
        assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());
    }
}
