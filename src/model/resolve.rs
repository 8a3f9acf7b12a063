// File: src/model/resolve.rs
//! Turns a canonical time phrase into an absolute timestamp.
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

/// Hour used when a phrase names a day but no time of day.
pub const DEFAULT_HOUR: u32 = 8;

/// Day-part keyword -> canonical hour, used by the fallback resolver.
pub const DAY_PART_HOURS: &[(&str, u32)] = &[
    ("morning", 8),
    ("noon", 12),
    ("afternoon", 16),
    ("evening", 19),
    ("tonight", 19),
];

/// A general-purpose date parser. Returns `None` when it cannot make sense of
/// the phrase, which hands it over to [`fallback_resolve`].
pub trait DateResolver: Send + Sync {
    fn resolve(&self, canonical: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayRef {
    Offset(i64),
    Weekday(Weekday),
}

/// Strict token grammar over the canonicalized phrase.
///
/// Prefers the future: a bare clock time already past today moves to
/// tomorrow, and a weekday always means its next occurrence after today.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalResolver;

impl DateResolver for CanonicalResolver {
    fn resolve(&self, canonical: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tokens: Vec<String> = canonical
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let mut hour: Option<u32> = None;
        let mut minute = 0;
        let mut is_pm: Option<bool> = None;
        let mut day: Option<DayRef> = None;

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i].as_str();
            let mut consumed = 1;

            match token {
                "at" | "on" | "the" | "this" | "next" => {}
                "am" | "pm" => {
                    if is_pm.is_some() {
                        return None;
                    }
                    is_pm = Some(token == "pm");
                }
                "today" | "tomorrow" | "day" => {
                    let offset = match token {
                        "today" => 0,
                        "tomorrow" => 1,
                        _ => {
                            if tokens.get(i + 1).map(String::as_str) == Some("after")
                                && tokens.get(i + 2).map(String::as_str) == Some("tomorrow")
                            {
                                consumed = 3;
                                2
                            } else {
                                return None;
                            }
                        }
                    };
                    if day.replace(DayRef::Offset(offset)).is_some() {
                        return None;
                    }
                }
                _ => {
                    if let Some(wd) = parse_weekday(token) {
                        if day.replace(DayRef::Weekday(wd)).is_some() {
                            return None;
                        }
                    } else if let Some((h, m)) = parse_clock(token) {
                        if hour.replace(h).is_some() {
                            return None;
                        }
                        minute = m;
                    } else if let Ok(h) = token.parse::<u32>() {
                        if hour.replace(h).is_some() {
                            return None;
                        }
                    } else {
                        return None;
                    }
                }
            }
            i += consumed;
        }

        let time = match (hour, is_pm) {
            (None, Some(_)) => return None,
            (None, None) if day.is_none() => return None,
            (None, None) => NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0)?,
            (Some(h), None) => NaiveTime::from_hms_opt(h, minute, 0)?,
            (Some(h), Some(pm)) => {
                if !(1..=12).contains(&h) {
                    return None;
                }
                let h24 = match (h, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                };
                NaiveTime::from_hms_opt(h24, minute, 0)?
            }
        };

        let today = now.date_naive();
        let date = match day {
            Some(DayRef::Offset(n)) => today + Duration::days(n),
            Some(DayRef::Weekday(wd)) => next_weekday(today, wd),
            None => {
                let candidate = localize(now, today, time)?;
                if candidate < *now {
                    today + Duration::days(1)
                } else {
                    return Some(candidate);
                }
            }
        };
        localize(now, date, time)
    }
}

static EXPLICIT_CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{1,2})\b").expect("clock pattern"));

/// Heuristic used when the resolver gives up.
///
/// `phrase` is the matched text before canonicalization (so day-part words
/// are still present); `canonical` is what the resolver was given.
pub fn fallback_resolve(phrase: &str, canonical: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let phrase = phrase.to_lowercase();
    let canonical = canonical.to_lowercase();

    let (hour, minute) = if let Some(caps) = EXPLICIT_CLOCK.captures(&canonical) {
        (caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?)
    } else if let Some(h) = day_part_hour(&phrase) {
        (h, 0)
    } else {
        (DEFAULT_HOUR, 0)
    };

    let offset_days = if phrase.contains("day after tomorrow") {
        2
    } else if phrase.contains("tomorrow") {
        1
    } else if phrase.contains("weekend") || canonical.contains("saturday") {
        days_until_saturday(now.weekday())
    } else {
        0
    };

    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let date = now.date_naive() + Duration::days(offset_days);
    log::debug!(
        "fallback resolved '{}' to {} {}",
        phrase,
        date,
        time.format("%H:%M")
    );
    localize(now, date, time)
}

fn day_part_hour(phrase: &str) -> Option<u32> {
    phrase.split_whitespace().find_map(|word| {
        DAY_PART_HOURS
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(_, h)| *h)
    })
}

/// Days from `from` to the next Saturday, 1..=7.
pub fn days_until_saturday(from: Weekday) -> i64 {
    (5 - from.number_from_monday() as i64).rem_euclid(7) + 1
}

fn next_weekday(from: NaiveDate, target: Weekday) -> NaiveDate {
    let mut d = from + Duration::days(1);
    while d.weekday() != target {
        d += Duration::days(1);
    }
    d
}

fn localize(now: &DateTime<Tz>, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    now.timezone()
        .from_local_datetime(&date.and_time(time))
        .earliest()
}

fn parse_clock(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let h = h.parse::<u32>().ok()?;
    let m = m.parse::<u32>().ok()?;
    (h < 24 && m < 60).then_some((h, m))
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    // Wednesday 2025-11-12 12:40 in Ho Chi Minh City.
    fn reference() -> DateTime<Tz> {
        chrono_tz::Asia::Ho_Chi_Minh
            .with_ymd_and_hms(2025, 11, 12, 12, 40, 0)
            .unwrap()
    }

    fn ymd_hm(dt: DateTime<Tz>) -> (i32, u32, u32, u32, u32) {
        (dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute())
    }

    #[test]
    fn test_days_until_saturday() {
        assert_eq!(days_until_saturday(Weekday::Mon), 5);
        assert_eq!(days_until_saturday(Weekday::Wed), 3);
        assert_eq!(days_until_saturday(Weekday::Fri), 1);
        assert_eq!(days_until_saturday(Weekday::Sat), 7);
        assert_eq!(days_until_saturday(Weekday::Sun), 6);
    }

    #[test]
    fn test_resolver_clock_prefers_future() {
        let r = CanonicalResolver;
        let later = r.resolve("14:00", &reference()).unwrap();
        assert_eq!(ymd_hm(later), (2025, 11, 12, 14, 0));
        let passed = r.resolve("9:00", &reference()).unwrap();
        assert_eq!(ymd_hm(passed), (2025, 11, 13, 9, 0));
    }

    #[test]
    fn test_resolver_meridiem_and_relative_day() {
        let r = CanonicalResolver;
        let dt = r.resolve("10 AM tomorrow", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 13, 10, 0));
        let dt = r.resolve("tomorrow at 3:00 PM", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 13, 15, 0));
        let dt = r.resolve("12:00 AM day after tomorrow", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 14, 0, 0));
    }

    #[test]
    fn test_resolver_weekday_is_strictly_upcoming() {
        let r = CanonicalResolver;
        let dt = r.resolve("10:30 thursday", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 13, 10, 30));
        // Same weekday as the reference means next week.
        let dt = r.resolve("wednesday", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 19, DEFAULT_HOUR, 0));
    }

    #[test]
    fn test_resolver_rejects_what_it_cannot_read() {
        let r = CanonicalResolver;
        assert!(r.resolve("tomorrow PM", &reference()).is_none());
        assert!(r.resolve("25:00", &reference()).is_none());
        assert!(r.resolve("15:00 PM", &reference()).is_none());
        assert!(r.resolve("soonish", &reference()).is_none());
        assert!(r.resolve("", &reference()).is_none());
    }

    #[test]
    fn test_fallback_day_part_table() {
        let dt = fallback_resolve("tomorrow morning", "tomorrow AM", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 13, 8, 0));
        let dt = fallback_resolve("evening today", "PM today", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 12, 19, 0));
        let dt = fallback_resolve("day after tomorrow afternoon", "day after tomorrow PM", &reference())
            .unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 14, 16, 0));
    }

    #[test]
    fn test_fallback_weekend_and_defaults() {
        let dt = fallback_resolve("weekend", "saturday", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 15, 8, 0));
        let dt = fallback_resolve("whenever", "whenever", &reference()).unwrap();
        assert_eq!(ymd_hm(dt), (2025, 11, 12, 8, 0));
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn test_fallback_invalid_clock_fails() {
        assert!(fallback_resolve("25:00", "25:00", &reference()).is_none());
    }
}
