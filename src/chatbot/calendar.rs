//! Jalali (Solar Hijri) and Gregorian dates for the date reply.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use std::fmt;

/// A date in the Jalali calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// Days before each Gregorian month in a non-leap year.
const DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

impl JalaliDate {
    /// Convert a Gregorian date by day count. Valid for years after 1600 AD.
    pub fn from_gregorian(date: NaiveDate) -> Self {
        let gy = date.year() as i64;
        let gm = date.month() as usize;
        let gd = date.day() as i64;

        // Leap day of the current year only counts once February is over
        let gy2 = if gm > 2 { gy + 1 } else { gy };
        let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400
            + gd
            + DAYS_BEFORE_MONTH[gm - 1];

        // 12053 days per 33-year cycle, 1461 per 4-year sub-cycle
        let mut jy = -1595 + 33 * (days / 12_053);
        days %= 12_053;
        jy += 4 * (days / 1461);
        days %= 1461;
        if days > 365 {
            jy += (days - 1) / 365;
            days = (days - 1) % 365;
        }

        // First six months have 31 days, the rest 30 (29 in Esfand)
        let (month, day) = if days < 186 {
            (1 + days / 31, 1 + days % 31)
        } else {
            (7 + (days - 186) / 30, 1 + (days - 186) % 30)
        };

        Self {
            year: jy as i32,
            month: month as u32,
            day: day as u32,
        }
    }
}

/// Both renderings of the local date at `now`: (Jalali, Gregorian).
pub fn local_dates<Tz: TimeZone>(now: &DateTime<Tz>) -> (String, String) {
    let date = now.date_naive();
    (
        JalaliDate::from_gregorian(date).to_string(),
        date.format("%Y-%m-%d").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn jalali(y: i32, m: u32, d: u32) -> JalaliDate {
        JalaliDate::from_gregorian(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_nowruz() {
        assert_eq!(jalali(2024, 3, 20), JalaliDate { year: 1403, month: 1, day: 1 });
        assert_eq!(jalali(2025, 3, 21), JalaliDate { year: 1404, month: 1, day: 1 });
        assert_eq!(jalali(2023, 3, 21), JalaliDate { year: 1402, month: 1, day: 1 });
    }

    #[test]
    fn test_last_day_of_leap_year() {
        // 1402 is a leap year in the 33-year cycle
        assert_eq!(jalali(2024, 3, 19), JalaliDate { year: 1402, month: 12, day: 29 });
    }

    #[test]
    fn test_second_half_of_year() {
        assert_eq!(jalali(1979, 2, 11), JalaliDate { year: 1357, month: 11, day: 22 });
        assert_eq!(jalali(2024, 12, 31), JalaliDate { year: 1403, month: 10, day: 11 });
        assert_eq!(jalali(2000, 1, 1), JalaliDate { year: 1378, month: 10, day: 11 });
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(jalali(2024, 3, 20).to_string(), "1403/01/01");
    }

    #[test]
    fn test_local_dates_follow_timezone() {
        // 21:00 UTC on March 19th is already March 20th in Tehran
        let utc = Utc.with_ymd_and_hms(2024, 3, 19, 21, 0, 0).unwrap();
        let tehran = utc.with_timezone(&chrono_tz::Asia::Tehran);

        assert_eq!(local_dates(&utc), ("1402/12/29".to_string(), "2024-03-19".to_string()));
        assert_eq!(local_dates(&tehran), ("1403/01/01".to_string(), "2024-03-20".to_string()));
    }
}
