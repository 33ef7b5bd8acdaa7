use chrono::{DateTime, Utc};
use ratio_study::report::{FormattedRow, RatioReportRow};
use serde::Serialize;

/// JSON document written by `report --format json`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub group_by: Option<String>,
    pub rows: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub group: String,
    #[serde(flatten)]
    pub stats: FormattedRow,
}

impl ReportDocument {
    pub fn new(
        source: String,
        group_by: Option<String>,
        rows: &[(String, RatioReportRow)],
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            source,
            group_by,
            rows: rows
                .iter()
                .map(|(group, row)| ReportEntry {
                    group: group.clone(),
                    stats: row.formatted(),
                })
                .collect(),
        }
    }
}
