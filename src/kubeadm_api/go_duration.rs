use anyhow::{bail, ensure, Context, Result};
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// The largest duration Go can represent, an int64 of nanoseconds
pub(crate) const MAX_GO_DURATION_NANOS: u128 = i64::MAX as u128;

// Renders the fractional part of value / unit without trailing zeros, e.g. (1500, 1000) -> "1.5"
fn format_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let mut fraction = value % unit;

    if fraction == 0 {
        return whole.to_string();
    }

    let mut digits = unit.to_string().len() - 1;
    while fraction % 10 == 0 {
        fraction /= 10;
        digits -= 1;
    }

    format!("{}.{:0width$}", whole, fraction, width = digits)
}

/// Formats a duration the way Go's time.Duration.String() does, e.g. "24h0m0s", "1m30s", "1.5s",
/// "250ms". Fails for durations that don't fit in a Go duration.
pub(crate) fn format_go_duration(duration: Duration) -> Result<String> {
    let nanos = duration.as_nanos();

    ensure!(
        nanos <= MAX_GO_DURATION_NANOS,
        "duration of {}s overflows a Go duration",
        duration.as_secs()
    );

    if nanos == 0 {
        return Ok("0s".to_string());
    }

    if nanos < NANOS_PER_MICRO {
        return Ok(format!("{}ns", nanos));
    }

    if nanos < NANOS_PER_MILLI {
        return Ok(format!("{}µs", format_fraction(nanos, NANOS_PER_MICRO)));
    }

    if nanos < NANOS_PER_SECOND {
        return Ok(format!("{}ms", format_fraction(nanos, NANOS_PER_MILLI)));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = format_fraction(nanos % NANOS_PER_MINUTE, NANOS_PER_SECOND);

    Ok(if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    })
}

/// Parses a Go duration string such as "24h", "1h30m" or "1.5s". Negative durations are
/// rejected as they have no meaning for a TTL.
pub(crate) fn parse_go_duration(value: &str) -> Result<Duration> {
    ensure!(!value.is_empty(), "empty duration");
    ensure!(!value.starts_with('-'), "negative duration {:?}", value);

    let mut remaining = value.strip_prefix('+').unwrap_or(value);

    if remaining == "0" {
        return Ok(Duration::ZERO);
    }

    ensure!(!remaining.is_empty(), "invalid duration {:?}", value);

    let mut total_nanos: u128 = 0;

    while !remaining.is_empty() {
        let number_length = remaining
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .with_context(|| format!("missing unit in duration {:?}", value))?;
        let (number, rest) = remaining.split_at(number_length);

        let unit_length = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_length);

        let unit_nanos = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            _ => bail!("unknown unit {:?} in duration {:?}", unit, value),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        ensure!(
            !(whole.is_empty() && fraction.is_empty()),
            "invalid duration {:?}",
            value
        );

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().with_context(|| format!("invalid duration {:?}", value))?
        };

        let mut fraction_nanos: u128 = 0;
        let mut scale = unit_nanos;
        for digit in fraction.chars() {
            scale /= 10;
            fraction_nanos += u128::from(digit.to_digit(10).with_context(|| format!("invalid duration {:?}", value))?) * scale;
        }

        total_nanos = whole
            .checked_mul(unit_nanos)
            .and_then(|nanos| nanos.checked_add(fraction_nanos))
            .and_then(|nanos| nanos.checked_add(total_nanos))
            .with_context(|| format!("duration {:?} overflows", value))?;

        ensure!(total_nanos <= MAX_GO_DURATION_NANOS, "duration {:?} overflows a Go duration", value);

        remaining = rest;
    }

    Ok(Duration::from_nanos(total_nanos as u64))
}
