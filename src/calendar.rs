//! Calendrier : jours du mois, week-ends et jours fériés fixes.
//!
//! Tout est une fonction pure de (année, mois, jour) ; les jours sont
//! numérotés à partir de 1.

use chrono::{Datelike, NaiveDate, Weekday};
use std::ops::RangeInclusive;

/// Jours fériés à date fixe, sous forme (mois, jour).
pub const FIXED_HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),
    (3, 1),
    (5, 5),
    (6, 6),
    (8, 15),
    (10, 3),
    (10, 9),
    (12, 25),
];

/// Nombre de jours du mois, `None` si le mois est invalide.
pub fn month_length(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// Jours `1..=N` du mois ; intervalle vide pour un mois invalide.
pub fn days_in_month(year: i32, month: u32) -> RangeInclusive<u32> {
    match month_length(year, month) {
        Some(n) => 1..=n,
        None => RangeInclusive::new(1, 0),
    }
}

pub fn weekday(year: i32, month: u32, day: u32) -> Option<Weekday> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.weekday())
}

pub fn is_weekend(year: i32, month: u32, day: u32) -> bool {
    matches!(weekday(year, month, day), Some(Weekday::Sat | Weekday::Sun))
}

/// Samedi, dimanche ou jour férié fixe. Une date invalide n'est jamais fériée.
pub fn is_holiday(year: i32, month: u32, day: u32) -> bool {
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return false;
    }
    is_weekend(year, month, day) || FIXED_HOLIDAYS.contains(&(month, day))
}

/// Jours où une aide-soignante peut tenir la nuit (dimanche, lundi, jeudi).
pub fn is_assistant_night_day(year: i32, month: u32, day: u32) -> bool {
    matches!(
        weekday(year, month, day),
        Some(Weekday::Sun | Weekday::Mon | Weekday::Thu)
    )
}

/// Nombre de jours de week-end ou fériés du mois.
///
/// Sert de valeur par défaut au minimum de repos mensuel.
pub fn weekend_holiday_count(year: i32, month: u32) -> u32 {
    days_in_month(year, month)
        .filter(|&d| is_holiday(year, month, d))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        assert_eq!(month_length(2026, 2), Some(28));
        assert_eq!(month_length(2024, 2), Some(29));
        assert_eq!(month_length(2025, 12), Some(31));
        assert_eq!(month_length(2025, 13), None);
        assert!(days_in_month(2025, 0).is_empty());
    }

    #[test]
    fn holidays_and_weekends() {
        // 2026-02-01 est un dimanche
        assert!(is_holiday(2026, 2, 1));
        assert!(!is_holiday(2026, 2, 2));
        assert!(is_holiday(2025, 12, 25));
        assert!(is_holiday(2025, 8, 15));
        assert!(!is_holiday(2025, 2, 30));
        assert_eq!(weekend_holiday_count(2026, 2), 8);
    }

    #[test]
    fn assistant_night_days() {
        assert!(is_assistant_night_day(2026, 2, 1)); // dimanche
        assert!(is_assistant_night_day(2026, 2, 2)); // lundi
        assert!(!is_assistant_night_day(2026, 2, 3)); // mardi
        assert!(is_assistant_night_day(2026, 2, 5)); // jeudi
    }
}
