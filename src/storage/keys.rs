use crate::errors::AppError;
use crate::models::question::SurveyType;
use crate::models::response::Entity;

pub const MAX_ID_LEN: usize = 128;

/// Key of the question CSV for a survey type.
pub fn questions_key(survey_type: SurveyType) -> String {
    format!("questions/{}_questions.csv", survey_type.as_str())
}

/// Key of the response document for an entity.
pub fn response_key(entity: &Entity) -> String {
    match entity {
        Entity::Company { company_id } => format!("companies/{company_id}/form.json"),
        Entity::Employee { company_id, employee_id } => {
            format!("companies/{company_id}/employees/{employee_id}/form.json")
        }
    }
}

/// Key of an uploaded attachment. Only employees upload files.
pub fn file_key(company_id: &str, employee_id: &str, filename: &str) -> String {
    format!("companies/{company_id}/employees/{employee_id}/files/{filename}")
}

/// Reduce a free-text company/employee ID to the `[a-z0-9._-]` key charset.
pub fn normalize_id(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Normalize an ID and reject values that cannot be a storage key segment.
pub fn validate_id(field: &str, raw: Option<&str>) -> Result<String, AppError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(AppError::validation(field, format!("{field} is required")));
    }
    let id = normalize_id(raw);
    if id.is_empty() || id.chars().all(|c| c == '.') {
        return Err(AppError::validation(
            field,
            format!("{field} must contain letters, digits, '.', '_' or '-'"),
        ));
    }
    if id.len() > MAX_ID_LEN {
        return Err(AppError::validation(
            field,
            format!("{field} must be at most {MAX_ID_LEN} characters"),
        ));
    }
    Ok(id)
}
