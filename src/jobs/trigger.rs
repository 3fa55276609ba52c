//! Trigger expressions accepted by the scheduler facade.
//!
//! Cron expressions are forwarded verbatim to tokio-cron-scheduler. The only
//! form handled here is the `@every <duration>` interval shorthand.

use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::jobs::error::JobError;

const EVERY_PREFIX: &str = "@every";

static DURATION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("duration pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Cron(String),
    Every(Duration),
}

impl FromStr for Trigger {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec.is_empty() {
            return Err(JobError::InvalidSchedule("empty expression".to_string()));
        }

        match spec.strip_prefix(EVERY_PREFIX) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                let interval = parse_duration(rest.trim())?;
                if interval.is_zero() {
                    return Err(JobError::InvalidSchedule(format!(
                        "{}: interval must be greater than zero",
                        spec
                    )));
                }
                Ok(Trigger::Every(whole_seconds(interval)))
            }
            _ => Ok(Trigger::Cron(spec.to_string())),
        }
    }
}

/// The repeat timer only ticks in whole seconds: intervals under a second
/// become one second and any sub-second remainder is dropped.
fn whole_seconds(interval: Duration) -> Duration {
    Duration::from_secs(interval.as_secs().max(1))
}

/// Parses durations such as `300ms`, `1.5s` or `1h30m`.
pub fn parse_duration(s: &str) -> Result<Duration, JobError> {
    let invalid = || JobError::InvalidSchedule(format!("invalid duration '{}'", s));

    if s.is_empty() {
        return Err(invalid());
    }

    let mut consumed = 0;
    let mut total = Duration::ZERO;
    for caps in DURATION_PART.captures_iter(s) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let unit_nanos: u128 = match &caps[2] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(invalid()),
        };
        let (int_part, frac_part) = caps[1].split_once('.').unwrap_or((&caps[1], ""));
        let whole_units: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole_units.checked_mul(unit_nanos).ok_or_else(invalid)?;
        if !frac_part.is_empty() {
            let digits = frac_part.len().min(18) as u32;
            let fraction: u128 = frac_part[..digits as usize].parse().map_err(|_| invalid())?;
            nanos += fraction * unit_nanos / 10u128.pow(digits);
        }
        total = total
            .checked_add(Duration::from_nanos(u64::try_from(nanos).map_err(|_| invalid())?))
            .ok_or_else(invalid)?;
    }

    if consumed != s.len() {
        return Err(invalid());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_durations() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("1m0.5s").unwrap(), Duration::from_millis(60_500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("1s junk").is_err());
        assert!(parse_duration("s1").is_err());
    }

    #[test]
    fn test_every_shorthand() {
        assert_eq!(
            "@every 1s".parse::<Trigger>().unwrap(),
            Trigger::Every(Duration::from_secs(1))
        );
        assert_eq!(
            "  @every 1h30m ".parse::<Trigger>().unwrap(),
            Trigger::Every(Duration::from_secs(5400))
        );
        assert!("@every 0s".parse::<Trigger>().is_err());
        assert!("@every 0ms".parse::<Trigger>().is_err());
        assert!("@every".parse::<Trigger>().is_err());
    }

    #[test]
    fn test_every_rounds_to_whole_seconds() {
        assert_eq!(
            "@every 200ms".parse::<Trigger>().unwrap(),
            Trigger::Every(Duration::from_secs(1))
        );
        assert_eq!(
            "@every 1ns".parse::<Trigger>().unwrap(),
            Trigger::Every(Duration::from_secs(1))
        );
        assert_eq!(
            "@every 1500ms".parse::<Trigger>().unwrap(),
            Trigger::Every(Duration::from_secs(1))
        );
        assert_eq!(
            "@every 2.9s".parse::<Trigger>().unwrap(),
            Trigger::Every(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_cron_passthrough() {
        assert_eq!(
            "0 */5 * * * *".parse::<Trigger>().unwrap(),
            Trigger::Cron("0 */5 * * * *".to_string())
        );
        assert_eq!(
            "@hourly".parse::<Trigger>().unwrap(),
            Trigger::Cron("@hourly".to_string())
        );
        assert_eq!(
            "@everyday".parse::<Trigger>().unwrap(),
            Trigger::Cron("@everyday".to_string())
        );
        assert!("   ".parse::<Trigger>().is_err());
    }
}
