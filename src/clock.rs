//! Minutes-since-midnight clock arithmetic, used throughout the stop
//! windows and the route assembler. All values wrap at 1440 (24h).

const MINUTES_PER_DAY: i64 = 1440;

/// Parse an `"HH:MM"` clock string into minutes since midnight.
pub fn str_to_minutes(clock: &str) -> anyhow::Result<u32> {
    let (h, m) = clock
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid clock string: {clock}"))?;
    let h: u32 = h.parse().map_err(|_| anyhow::anyhow!("invalid hour in {clock}"))?;
    let m: u32 = m.parse().map_err(|_| anyhow::anyhow!("invalid minute in {clock}"))?;
    if h > 23 || m > 59 {
        anyhow::bail!("clock string out of range: {clock}");
    }
    Ok(h * 60 + m)
}

/// Format minutes since midnight as an `"HH:MM"` clock string, wrapping
/// at 24h so that e.g. 1440 becomes "00:00".
pub fn minutes_to_str(minutes: i64) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ordinary_times() {
        for clock in ["00:00", "08:30", "12:00", "23:59"] {
            let minutes = str_to_minutes(clock).unwrap();
            assert_eq!(minutes_to_str(minutes as i64), clock);
        }
    }

    #[test]
    fn wraps_past_midnight() {
        let minutes = str_to_minutes("23:59").unwrap() as i64 + 1;
        assert_eq!(minutes_to_str(minutes), "00:00");
    }

    #[test]
    fn wraps_multiple_days() {
        assert_eq!(minutes_to_str(1440), "00:00");
        assert_eq!(minutes_to_str(1500), "01:00");
        assert_eq!(minutes_to_str(-1), "23:59");
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(str_to_minutes("9:5").is_ok());
        assert!(str_to_minutes("25:00").is_err());
        assert!(str_to_minutes("10:60").is_err());
        assert!(str_to_minutes("garbage").is_err());
    }
}
