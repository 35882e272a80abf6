//! Parsing helpers for durations, context paths, and value shapes.

use chrono::{Duration, Utc};
use txledger_core::{ContextPath, MapKey, Step, Value, ValueShape};

/// Parse a duration string (e.g., "7d", "24h").
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    if value.len() < 2 {
        return Err(anyhow::anyhow!(
            "Invalid duration: {} (expected <number><unit>)",
            value
        ));
    }

    let (num_str, unit) = value.split_at(value.len() - 1);
    let amount: i64 = num_str
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", value))?;
    if amount < 0 {
        return Err(anyhow::anyhow!("Duration must not be negative: {}", value));
    }

    match unit {
        "d" => Ok(Duration::days(amount)),
        "h" => Ok(Duration::hours(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "s" => Ok(Duration::seconds(amount)),
        _ => Err(anyhow::anyhow!(
            "Invalid duration unit: {} (use d/h/m/s)",
            unit
        )),
    }
}

/// Parse a retention window into the engine's `std` duration.
pub fn parse_window(value: &str) -> anyhow::Result<std::time::Duration> {
    parse_duration(value)?
        .to_std()
        .map_err(|_| anyhow::anyhow!("Duration out of range: {}", value))
}

/// Parse a context path such as `splits/=4`, `1` or `#7/*`.
///
/// Steps are separated by `/`. An integer is a list index (negative counts
/// from the end), `#n` an integer map key, `=json` a value match, `*` a
/// wildcard, and anything else a string map key. An empty path (or `.`)
/// addresses the value itself.
pub fn parse_path(value: &str) -> anyhow::Result<ContextPath> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Ok(ContextPath::root());
    }

    let steps = trimmed
        .split('/')
        .map(|segment| parse_step(segment, value))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(ContextPath::new(steps))
}

fn parse_step(segment: &str, path: &str) -> anyhow::Result<Step> {
    if segment.is_empty() {
        return Err(anyhow::anyhow!("Empty step in path: {}", path));
    }
    if segment == "*" {
        return Ok(Step::Wildcard);
    }
    if let Some(literal) = segment.strip_prefix('=') {
        let json: serde_json::Value = serde_json::from_str(literal)
            .map_err(|e| anyhow::anyhow!("Invalid match value {} in path {}: {}", literal, path, e))?;
        return Ok(Step::ByValueMatch(Value::from_json(&json)));
    }
    if let Some(key) = segment.strip_prefix('#') {
        let key: i64 = key
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid integer key {} in path {}", segment, path))?;
        return Ok(Step::ByKey(MapKey::Int(key)));
    }
    if let Ok(index) = segment.parse::<i64>() {
        return Ok(Step::ByIndex(index));
    }
    Ok(Step::ByKey(MapKey::from(segment)))
}

/// Parse a value shape name (flat, list, map).
pub fn parse_shape(value: &str) -> anyhow::Result<ValueShape> {
    value
        .parse::<ValueShape>()
        .map_err(|e| anyhow::anyhow!("{}", e))
}

/// Current time as fractional epoch seconds.
pub fn now_epoch() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("0s").unwrap(), Duration::zero());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("-3h").is_err());
        assert!(parse_duration("3w").is_err());
    }

    #[test]
    fn test_parse_window_in_seconds() {
        assert_eq!(parse_window("100s").unwrap().as_secs(), 100);
        assert_eq!(parse_window("2m").unwrap().as_secs(), 120);
    }

    #[test]
    fn test_parse_path_steps() {
        let path = parse_path("splits/=4").unwrap();
        assert_eq!(
            path,
            ContextPath::root().key("splits").value_match(Value::Int(4))
        );

        let path = parse_path("-1/#7/*/amount").unwrap();
        assert_eq!(
            path,
            ContextPath::root()
                .index(-1)
                .key(MapKey::Int(7))
                .wildcard()
                .key("amount")
        );

        assert_eq!(parse_path("").unwrap(), ContextPath::root());
        assert_eq!(parse_path(".").unwrap(), ContextPath::root());
    }

    #[test]
    fn test_parse_path_rejects_malformed_steps() {
        assert!(parse_path("a//b").is_err());
        assert!(parse_path("#x").is_err());
        assert!(parse_path("={oops").is_err());
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("map").unwrap(), ValueShape::Map);
        assert!(parse_shape("tree").is_err());
    }
}
