use chrono::{DateTime, NaiveDate, Utc};

/// Format a task's age as a human-readable string.
pub fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - created).num_days().max(0) as u64;
    if days == 0 {
        "new".to_string()
    } else if days < 14 {
        format!("{days}d")
    } else if days < 60 {
        format!("{}w", days / 7)
    } else {
        format!("{}mo", days / 30)
    }
}

/// How close a task's due date is, relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    Today,
    Tomorrow,
    Upcoming,
}

/// Classify a due date and build its display label.
///
/// Dates are shown day-first (`31.01.2025`).
pub fn due_status(due: NaiveDate, today: NaiveDate) -> (DueStatus, String) {
    let formatted = due.format("%d.%m.%Y").to_string();
    match (due - today).num_days() {
        d if d < 0 => (DueStatus::Overdue, format!("Overdue ({formatted})")),
        0 => (DueStatus::Today, "Today".to_string()),
        1 => (DueStatus::Tomorrow, "Tomorrow".to_string()),
        _ => (DueStatus::Upcoming, formatted),
    }
}

/// Parse a `YYYY-MM-DD` date typed by the user. Blank input means "no date".
pub fn parse_due_input(input: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("invalid date '{trimmed}': use YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_age() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        assert_eq!(format_age(now, now), "new");

        let created_3d = Utc.with_ymd_and_hms(2025, 6, 12, 12, 0, 0).unwrap();
        assert_eq!(format_age(created_3d, now), "3d");

        let created_2w = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_age(created_2w, now), "2w");

        let created_3mo = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(format_age(created_3mo, now), "3mo");
    }

    #[test]
    fn test_due_status() {
        let today = date(2025, 6, 15);
        assert_eq!(
            due_status(date(2025, 6, 10), today),
            (DueStatus::Overdue, "Overdue (10.06.2025)".to_string())
        );
        assert_eq!(due_status(today, today), (DueStatus::Today, "Today".to_string()));
        assert_eq!(
            due_status(date(2025, 6, 16), today),
            (DueStatus::Tomorrow, "Tomorrow".to_string())
        );
        assert_eq!(
            due_status(date(2025, 7, 1), today),
            (DueStatus::Upcoming, "01.07.2025".to_string())
        );
    }

    #[test]
    fn test_parse_due_input() {
        assert_eq!(parse_due_input("  "), Ok(None));
        assert_eq!(parse_due_input("2025-01-01"), Ok(Some(date(2025, 1, 1))));
        assert!(parse_due_input("01.01.2025").is_err());
    }
}
