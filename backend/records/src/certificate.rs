use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Header cells, in storage order.
pub const COLUMNS: [&str; 6] = [
    "Certificate No",
    "Student Name",
    "Father Name",
    "Duration",
    "Completion Date",
    "Status",
];

pub type Row = Vec<String>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub certificate_no: String,
    pub student_name: String,
    pub father_name: String,
    pub duration: String,
    pub completion_date: String,
    pub status: String,
}

impl Certificate {
    /// Missing trailing cells become empty text, extra cells are ignored.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |index: usize| row.get(index).cloned().unwrap_or_default();

        Self {
            certificate_no: cell(0),
            student_name: cell(1),
            father_name: cell(2),
            duration: cell(3),
            completion_date: cell(4),
            status: cell(5),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.certificate_no.clone(),
            self.student_name.clone(),
            self.father_name.clone(),
            self.duration.clone(),
            self.completion_date.clone(),
            self.status.clone(),
        ]
    }

    pub fn matches(&self, certificate_no: &str) -> bool {
        ids_match(&self.certificate_no, certificate_no)
    }

    /// Completion date as a long date, falling back to the stored text.
    pub fn display_date(&self) -> String {
        long_date(&self.completion_date).unwrap_or_else(|| self.completion_date.clone())
    }
}

pub fn header_row() -> Row {
    COLUMNS.iter().map(|column| column.to_string()).collect()
}

/// Case-insensitive certificate number comparison. Empty on either side never matches.
pub fn ids_match(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }

    left.to_lowercase() == right.to_lowercase()
}

/// Renders `2024-01-15` (or an RFC 3339 timestamp) as `January 15, 2024`.
pub fn long_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))?;

    Some(date.format("%B %-d, %Y").to_string())
}
