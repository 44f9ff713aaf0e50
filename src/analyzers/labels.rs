/// English weekday names indexed from Monday = 0.
const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Converts an hour of day into its one-hour range label.
///
/// | Hour | Label         |
/// |------|---------------|
/// | 0    | `0:00-1:00`   |
/// | 10   | `10:00-11:00` |
/// | 23   | `23:00-24:00` |
pub fn hour_label(hour: u32) -> String {
    format!("{}:00-{}:00", hour, hour + 1)
}

/// Converts a Monday-based weekday index into its English name.
pub fn weekday_label(weekday: u32) -> &'static str {
    WEEKDAY_NAMES[weekday as usize % 7]
}

/// Collapses a weekday index into 0 for Monday-Friday and 1 for the weekend.
pub fn weekday_type(weekday: u32) -> u32 {
    if weekday >= 5 { 1 } else { 0 }
}

/// `週間` for working days, `週末` for the weekend.
pub fn weekday_type_label(weekday_type: u32) -> &'static str {
    match weekday_type {
        0 => "週間",
        _ => "週末",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_label_boundaries() {
        assert_eq!(hour_label(0), "0:00-1:00");
        assert_eq!(hour_label(9), "9:00-10:00");
        assert_eq!(hour_label(23), "23:00-24:00");
    }

    #[test]
    fn test_weekday_labels() {
        assert_eq!(weekday_label(0), "Monday");
        assert_eq!(weekday_label(5), "Saturday");
        assert_eq!(weekday_label(6), "Sunday");
    }

    #[test]
    fn test_weekday_type_split() {
        for day in 0..5 {
            assert_eq!(weekday_type(day), 0);
        }
        assert_eq!(weekday_type(5), 1);
        assert_eq!(weekday_type(6), 1);
        assert_eq!(weekday_type_label(0), "週間");
        assert_eq!(weekday_type_label(1), "週末");
    }
}
