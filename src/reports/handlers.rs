use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    csv_export::{daily_totals_csv, entries_csv},
    dto::{ExportQuery, MonthlyQuery, ReportFormat},
};
use crate::{
    auth::extractors::RequireAdmin,
    error::AppError,
    ledger::{
        repo_types::LedgerEntry,
        services::{self as ledger, MonthlyAggregate},
    },
    payload::Params,
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/export", get(export_csv))
        .route("/api/monthly", get(monthly_summary))
}

/// Which entries an export covers; a full range wins over a single date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    Range { start: String, end: String },
    Day(String),
    All,
}

impl ExportScope {
    pub fn from_query(q: &ExportQuery) -> Result<Self, AppError> {
        let start = ledger::parse_optional_date(q.start.as_deref())?;
        let end = ledger::parse_optional_date(q.end.as_deref())?;
        if let (Some(start), Some(end)) = (start, end) {
            return Ok(ExportScope::Range { start, end });
        }
        Ok(match ledger::parse_optional_date(q.date.as_deref())? {
            Some(date) => ExportScope::Day(date),
            None => ExportScope::All,
        })
    }

    pub fn filename(&self) -> String {
        match self {
            ExportScope::Range { start, end } => format!("messages_{start}_to_{end}.csv"),
            ExportScope::Day(date) => format!("messages_{date}.csv"),
            ExportScope::All => "messages_all.csv".to_string(),
        }
    }
}

fn attachment(content_type: &'static str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response()
}

#[instrument(skip(state), fields(username = %admin.0.username))]
pub async fn export_csv(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Params(q): Params<ExportQuery>,
) -> Result<Response, AppError> {
    let scope = ExportScope::from_query(&q)?;
    let entries = match &scope {
        ExportScope::Range { start, end } => LedgerEntry::range(&state.db, start, end).await?,
        ExportScope::Day(date) => LedgerEntry::for_date(&state.db, date).await?,
        ExportScope::All => LedgerEntry::all(&state.db).await?,
    };
    let body = entries_csv(&entries)?;
    info!(rows = entries.len(), filename = %scope.filename(), "csv export");
    Ok(attachment("text/csv", &scope.filename(), body))
}

/// Year and month from the query; if either is missing both default to today's.
fn resolve_month(q: &MonthlyQuery) -> Result<(i32, u8), AppError> {
    let year = q.year.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let month = q.month.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (year, month) {
        (Some(year), Some(month)) => {
            let year = year
                .parse::<i32>()
                .map_err(|_| AppError::invalid_input("year must be an integer"))?;
            let month = month
                .parse::<u8>()
                .map_err(|_| AppError::invalid_input("month must be between 1 and 12"))?;
            Ok((year, month))
        }
        _ => {
            let today = ledger::today();
            Ok((today.year(), u8::from(today.month())))
        }
    }
}

pub fn pdf_lines(agg: &MonthlyAggregate) -> Vec<String> {
    let mut lines = Vec::with_capacity(agg.by_day.len() + 2);
    lines.push(format!(
        "Monthly summary for {}-{:02} Total: {:.2}",
        agg.year, agg.month, agg.total
    ));
    lines.push(String::new());
    lines.extend(
        agg.by_day
            .iter()
            .map(|day| format!("{}: {:.2}", day.date, day.total)),
    );
    lines
}

#[instrument(skip(state))]
pub async fn monthly_summary(
    State(state): State<AppState>,
    Params(q): Params<MonthlyQuery>,
) -> Result<Response, AppError> {
    let format = ReportFormat::parse(q.format.as_deref())
        .ok_or_else(|| AppError::invalid_input("format must be one of json, csv, pdf"))?;
    let (year, month) = resolve_month(&q)?;
    let agg = ledger::monthly_aggregate(&state.db, year, month).await?;

    match format {
        ReportFormat::Json => Ok(Json(agg).into_response()),
        ReportFormat::Csv => {
            let body = daily_totals_csv(&agg.by_day)?;
            Ok(attachment(
                "text/csv",
                &format!("monthly_{year}_{month:02}.csv"),
                body,
            ))
        }
        ReportFormat::Pdf => {
            let renderer = state.pdf.as_ref().ok_or_else(|| {
                AppError::UnavailableFeature("PDF export is not available in this build".into())
            })?;
            let title = format!("Monthly summary {year}-{month:02}");
            let bytes = renderer.render_lines(&title, &pdf_lines(&agg))?;
            Ok(attachment(
                "application/pdf",
                &format!("monthly_{year}_{month:02}.pdf"),
                bytes,
            ))
        }
    }
}
