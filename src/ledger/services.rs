use serde::Serialize;
use sqlx::SqlitePool;
use time::{macros::format_description, Date, Month, OffsetDateTime};

use crate::error::AppError;
use crate::ledger::repo_types::{DailyTotal, LedgerEntry};

pub const DEFAULT_PER_PAGE: i64 = 50;
pub const MAX_PER_PAGE: i64 = 500;

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn format_date(date: Date) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    date.format(&fmt).unwrap_or_default()
}

/// Strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), &fmt)
        .map_err(|_| AppError::invalid_input(format!("invalid date {raw:?}, expected YYYY-MM-DD")))
}

/// Optional date parameter; empty strings count as absent.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<String>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_date(s).map(format_date))
        .transpose()
}

/// Numeric amount from a JSON number or numeric string; everything else is 0.
pub fn coerce_amount(raw: Option<&serde_json::Value>) -> f64 {
    let value = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> Result<Self, AppError> {
        let page = parse_int("page", page)?.unwrap_or(1).max(1);
        let per_page = parse_int("per_page", per_page)?
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

fn parse_int(name: &str, raw: Option<&str>) -> Result<Option<i64>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::invalid_input(format!("{name} must be an integer")))
        })
        .transpose()
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub items: Vec<LedgerEntry>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

pub async fn list(db: &SqlitePool, date: Option<&str>, pagination: Pagination) -> Result<Page, AppError> {
    let items = LedgerEntry::list_page(db, date, pagination.per_page, pagination.offset()).await?;
    let total = LedgerEntry::count(db, date).await?;
    Ok(Page {
        items,
        page: pagination.page,
        per_page: pagination.per_page,
        total,
    })
}

/// First day of the month and first day of the following month.
pub fn month_bounds(year: i32, month: u8) -> Result<(Date, Date), AppError> {
    if !(1..=9998).contains(&year) {
        return Err(AppError::invalid_input("year must be between 1 and 9998"));
    }
    let month = Month::try_from(month)
        .map_err(|_| AppError::invalid_input("month must be between 1 and 12"))?;
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        m => (year, m.next()),
    };
    let start = Date::from_calendar_date(year, month, 1)
        .map_err(|e| AppError::invalid_input(e.to_string()))?;
    let end = Date::from_calendar_date(next_year, next_month, 1)
        .map_err(|e| AppError::invalid_input(e.to_string()))?;
    Ok((start, end))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u8,
    pub total: f64,
    pub by_day: Vec<DailyTotal>,
}

pub async fn monthly_aggregate(db: &SqlitePool, year: i32, month: u8) -> Result<MonthlyAggregate, AppError> {
    let (start, end) = month_bounds(year, month)?;
    let by_day = DailyTotal::between(db, &format_date(start), &format_date(end)).await?;
    let total = by_day.iter().map(|d| d.total).sum();
    Ok(MonthlyAggregate {
        year,
        month,
        total,
        by_day,
    })
}
