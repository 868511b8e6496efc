use std::path::Path;

use crate::errors::AppError;
use crate::storage::{ObjectStore, keys};
use super::parse::parse_questions;
use super::types::{Question, SurveyType};

/// Load the question set for a survey type from its uploaded CSV.
pub async fn load(store: &dyn ObjectStore, survey_type: SurveyType) -> Result<Vec<Question>, AppError> {
    let key = keys::questions_key(survey_type);
    let bytes = store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Questions for type '{survey_type}'")))?;

    let text = String::from_utf8(bytes)
        .map_err(|_| AppError::Format(format!("{key} is not valid UTF-8")))?;
    let questions = parse_questions(&text).map_err(|e| match e {
        AppError::Format(msg) => AppError::Format(format!("{key}: {msg}")),
        other => other,
    })?;

    log::debug!("Loaded {} questions from {}", questions.len(), key);
    Ok(questions)
}

/// Validate and upload the question CSVs found in `dir`. Files that are absent
/// are skipped; a malformed file aborts seeding before it is uploaded.
pub async fn seed_from_dir(store: &dyn ObjectStore, dir: &Path) -> Result<usize, AppError> {
    let mut uploaded = 0;
    for survey_type in SurveyType::ALL {
        let key = keys::questions_key(survey_type);
        let file_name = format!("{}_questions.csv", survey_type.as_str());
        let path = dir.join(&file_name);

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Question seed: {} not found, skipping", path.display());
                continue;
            }
            Err(e) => {
                return Err(AppError::Format(format!("{}: {e}", path.display())));
            }
        };

        let questions = parse_questions(&text).map_err(|e| match e {
            AppError::Format(msg) => AppError::Format(format!("{file_name}: {msg}")),
            other => other,
        })?;
        store.put(&key, text.into_bytes(), "text/csv").await?;
        log::info!("Question seed: uploaded {} questions to {}", questions.len(), key);
        uploaded += 1;
    }
    Ok(uploaded)
}
