use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<String>,
    pub month: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    Pdf,
}

impl ReportFormat {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Some(ReportFormat::Json),
            Some(s) if s.eq_ignore_ascii_case("json") => Some(ReportFormat::Json),
            Some(s) if s.eq_ignore_ascii_case("csv") => Some(ReportFormat::Csv),
            Some(s) if s.eq_ignore_ascii_case("pdf") => Some(ReportFormat::Pdf),
            Some(_) => None,
        }
    }
}
