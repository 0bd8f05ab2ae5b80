use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, Date, Time};

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Delimiter used for list columns at the storage boundary.
pub const LIST_DELIMITER: char = ',';

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn email(email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(())
}

pub fn password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn not_blank(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

pub fn parse_date(field: &str, value: &str) -> AppResult<Date> {
    Date::parse(value, DATE_FORMAT)
        .map_err(|_| AppError::validation(format!("{field} must be a YYYY-MM-DD date")))
}

pub fn parse_time(field: &str, value: &str) -> AppResult<Time> {
    Time::parse(value, TIME_FORMAT)
        .map_err(|_| AppError::validation(format!("{field} must be a HH:MM time")))
}

pub fn format_date(date: Date) -> String {
    // four-digit years always fit the format
    date.format(DATE_FORMAT).unwrap_or_default()
}

pub fn date_range(start: &str, end: &str) -> AppResult<()> {
    let start = parse_date("start_date", start)?;
    let end = parse_date("end_date", end)?;
    if start > end {
        return Err(AppError::validation(
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

/// Trims each entry and rejects blanks or entries that would collide with
/// the storage delimiter.
pub fn list_entries(field: &str, values: Vec<String>) -> AppResult<Vec<String>> {
    values
        .into_iter()
        .map(|v| {
            let v = v.trim().to_string();
            if v.is_empty() {
                return Err(AppError::validation(format!(
                    "{field} entries must not be empty"
                )));
            }
            if v.contains(LIST_DELIMITER) {
                return Err(AppError::validation(format!(
                    "{field} entries must not contain '{LIST_DELIMITER}'"
                )));
            }
            Ok(v)
        })
        .collect()
}
