use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, NaiveDate};
use regex::Regex;
use tracing::trace;

/// Resolves a due-date expression relative to `today`.
///
/// Accepts `today`, `tomorrow`, `yesterday`, relative offsets such as `+3d`
/// or `-2w`, plain `YYYY-MM-DD` dates and RFC 3339 timestamps.
pub fn parse_due_expr(raw: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(anyhow!("due date cannot be empty"));
    }

    let lower = token.to_ascii_lowercase();
    match lower.as_str() {
        "today" | "now" => return Ok(today),
        "tomorrow" => return shift(today, 1),
        "yesterday" => return shift(today, -1),
        _ => {}
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

    if let Some(caps) = rel_re.captures(&lower) {
        let num: i64 = caps["num"]
            .parse()
            .context("invalid relative number")?;
        let days = match &caps["unit"] {
            "d" => num,
            "w" => num.checked_mul(7).ok_or_else(|| anyhow!("relative offset too large"))?,
            unit => return Err(anyhow!("unknown relative unit: {unit}")),
        };
        let days = if &caps["sign"] == "-" { -days } else { days };
        trace!(token, days, "resolved relative due date");
        return shift(today, days);
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Ok(dt.date_naive());
    }

    Err(anyhow!(
        "unrecognized due date `{token}` (try today, tomorrow, +3d or YYYY-MM-DD)"
    ))
}

fn shift(today: NaiveDate, days: i64) -> anyhow::Result<NaiveDate> {
    let delta = Duration::try_days(days).ok_or_else(|| anyhow!("relative offset too large"))?;
    today
        .checked_add_signed(delta)
        .ok_or_else(|| anyhow!("due date out of range"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::parse_due_expr;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn named_days() {
        let today = day(2026, 12, 31);
        assert_eq!(parse_due_expr("today", today).expect("today"), today);
        assert_eq!(parse_due_expr("Tomorrow", today).expect("tomorrow"), day(2027, 1, 1));
        assert_eq!(parse_due_expr("yesterday", today).expect("yesterday"), day(2026, 12, 30));
    }

    #[test]
    fn relative_offsets() {
        let today = day(2026, 10, 18);
        assert_eq!(parse_due_expr("+3d", today).expect("+3d"), day(2026, 10, 21));
        assert_eq!(parse_due_expr("-1w", today).expect("-1w"), day(2026, 10, 11));
    }

    #[test]
    fn absolute_forms() {
        let today = day(2026, 10, 18);
        assert_eq!(parse_due_expr("2026-11-05", today).expect("date"), day(2026, 11, 5));
        assert_eq!(
            parse_due_expr("2026-11-05T23:00:00+00:00", today).expect("rfc3339"),
            day(2026, 11, 5)
        );
        assert!(parse_due_expr("next blue moon", today).is_err());
        assert!(parse_due_expr("  ", today).is_err());
    }
}
