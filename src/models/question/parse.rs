use std::collections::HashSet;

use crate::errors::AppError;
use super::types::{Question, QuestionKind};

/// Columns every question CSV must carry. `text` is accepted in place of `question`.
pub const REQUIRED_COLUMNS: [&str; 6] = ["id", "question", "type", "required", "options", "section"];

struct Columns {
    id: usize,
    question: usize,
    kind: usize,
    required: usize,
    options: usize,
    section: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, AppError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|h| h == name);

        let mut missing = Vec::new();
        let mut column = |name: &'static str, alias: Option<&str>| {
            let found = find(name).or_else(|| alias.and_then(|a| find(a)));
            if found.is_none() {
                missing.push(name);
            }
            found.unwrap_or(0)
        };

        let cols = Columns {
            id: column("id", None),
            question: column("question", Some("text")),
            kind: column("type", None),
            required: column("required", None),
            options: column("options", None),
            section: column("section", None),
        };
        if !missing.is_empty() {
            return Err(AppError::Format(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(cols)
    }
}

fn parse_required(raw: &str, row: usize) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Ok(false),
        "true" | "yes" | "y" | "1" => Ok(true),
        other => Err(AppError::Format(format!(
            "row {row}: 'required' must be a boolean, got '{other}'"
        ))),
    }
}

/// Split an options cell. `;` and `|` take precedence over `,` so option
/// labels like "£250k, rising" survive in files that use them.
pub fn split_options(cell: &str) -> Vec<String> {
    let sep = if cell.contains(';') {
        ';'
    } else if cell.contains('|') {
        '|'
    } else {
        ','
    };
    cell.split(sep)
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a question CSV into questions in row order.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::Format(format!("unreadable header: {e}")))?
        .clone();
    let cols = Columns::from_headers(&headers)?;

    let mut questions = Vec::new();
    let mut seen = HashSet::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|e| AppError::Format(format!("row {row}: {e}")))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let id = cell(cols.id);
        if id.is_empty() {
            return Err(AppError::Format(format!("row {row}: empty id")));
        }
        if !seen.insert(id.to_string()) {
            return Err(AppError::Format(format!("row {row}: duplicate id '{id}'")));
        }

        questions.push(Question {
            id: id.to_string(),
            text: cell(cols.question).to_string(),
            kind: QuestionKind::from_parts(cell(cols.kind), split_options(cell(cols.options))),
            required: parse_required(cell(cols.required), row)?,
            section: cell(cols.section).to_string(),
        });
    }
    Ok(questions)
}
