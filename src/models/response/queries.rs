use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::models::upload::{UploadLimits, prepare_uploads};
use crate::storage::{ObjectStore, StorageError, StorageErrorCode, keys};
use super::types::*;

/// Per-key change carried by a save request: `None` clears the answer.
pub type AnswerUpdate = (String, Option<Answer>);

/// Read the response document for an entity. A missing document is `Ok(None)`.
pub async fn find(store: &dyn ObjectStore, entity: &Entity) -> Result<Option<ResponseDocument>, AppError> {
    let key = keys::response_key(entity);
    let Some(bytes) = store.get(&key).await? else {
        log::info!("No existing response at {}", key);
        return Ok(None);
    };
    let doc = serde_json::from_slice(&bytes).map_err(|e| {
        StorageError::new(StorageErrorCode::Corrupt, format!("{key}: {e}"))
    })?;
    Ok(Some(doc))
}

fn answer_from_json(key: &str, value: &Value) -> Result<Option<Answer>, AppError> {
    let field = format!("responses.{key}");
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(Answer::Text(s.clone()))),
        Value::Number(n) => Ok(Some(Answer::Number(n.clone()))),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(AppError::validation(
                    &field,
                    format!("{field} must contain only strings"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Some(Answer::Many(items))),
        Value::Bool(_) | Value::Object(_) => Err(AppError::validation(
            &field,
            format!("{field} must be a string, a number or a list of strings"),
        )),
    }
}

/// Validate the `responses` payload of a save request.
pub fn parse_responses(value: Option<&Value>) -> Result<Vec<AnswerUpdate>, AppError> {
    let Some(Value::Object(map)) = value else {
        return Err(AppError::validation(
            "responses",
            "responses must be an object mapping question ids to answers",
        ));
    };
    map.iter()
        .map(|(key, value)| {
            if key.trim().is_empty() {
                return Err(AppError::validation("responses", "question ids must not be empty"));
            }
            Ok((key.clone(), answer_from_json(key, value)?))
        })
        .collect()
}

/// Additive merge: new values replace old ones per key, keys absent from the
/// update are kept, an explicit `None` removes the key.
pub fn merge_responses(existing: &mut BTreeMap<String, Answer>, updates: Vec<AnswerUpdate>) {
    for (key, answer) in updates {
        match answer {
            Some(answer) => {
                existing.insert(key, answer);
            }
            None => {
                existing.remove(&key);
            }
        }
    }
}

/// Validate a save request, merge it into the stored document and write the
/// result back. Every check runs before the first write.
///
/// Without `expected_revision` concurrent saves race and the last writer wins.
pub async fn save(
    store: &dyn ObjectStore,
    req: &SaveRequest,
    limits: &UploadLimits,
) -> Result<SaveConfirmation, AppError> {
    let entity = Entity::resolve(
        req.survey_type.as_deref(),
        req.company_id.as_deref(),
        req.employee_id.as_deref(),
    )?;
    let updates = parse_responses(req.responses.as_ref())?;

    let uploads = match (req.files.as_deref(), &entity) {
        (None | Some([]), _) => Vec::new(),
        (Some(_), Entity::Company { .. }) => {
            return Err(AppError::validation(
                "files",
                "files are only accepted for employee responses",
            ));
        }
        (Some(files), Entity::Employee { .. }) => prepare_uploads(files, limits)?,
    };

    let key = keys::response_key(&entity);
    let mut doc = find(store, &entity)
        .await?
        .unwrap_or_else(|| ResponseDocument::empty(&entity));

    if let Some(expected) = req.expected_revision {
        if expected != doc.revision {
            return Err(AppError::Conflict {
                expected,
                actual: doc.revision,
            });
        }
    }

    let now = Utc::now();
    merge_responses(&mut doc.responses, updates);

    if let Entity::Employee { company_id, employee_id } = &entity {
        for upload in &uploads {
            let file_key = keys::file_key(company_id, employee_id, &upload.filename);
            store
                .put(&file_key, upload.bytes.clone(), &upload.content_type)
                .await?;
            log::info!("Stored attachment {} ({} bytes)", file_key, upload.bytes.len());

            let record = FileRecord {
                filename: upload.filename.clone(),
                original_filename: upload.original_filename.clone(),
                content_type: upload.content_type.clone(),
                size: upload.bytes.len() as u64,
                uploaded_at: Some(now),
            };
            match doc.files.iter_mut().find(|f| f.filename == record.filename) {
                Some(existing) => *existing = record,
                None => doc.files.push(record),
            }
        }
    }

    if req.submitted {
        doc.submitted_at = Some(now);
    }
    doc.survey_type = entity.survey_type();
    doc.company_id = entity.company_id().to_string();
    doc.employee_id = entity.employee_id().map(str::to_string);
    doc.created_at.get_or_insert(now);
    doc.updated_at = Some(now);
    doc.last_save = SaveMode::from_flags(req.auto_save, req.page_save, req.submitted);
    doc.revision += 1;

    let body = serde_json::to_vec_pretty(&doc).map_err(|e| {
        StorageError::new(StorageErrorCode::Corrupt, format!("{key}: {e}"))
    })?;
    store.put(&key, body, "application/json").await?;

    log::info!(
        "Saved {} response to {} (revision {}, {:?})",
        entity.survey_type(),
        key,
        doc.revision,
        doc.last_save
    );

    Ok(SaveConfirmation {
        message: "Response saved successfully".to_string(),
        survey_type: entity.survey_type(),
        company_id: entity.company_id().to_string(),
        employee_id: entity.employee_id().map(str::to_string),
        uploaded_files: uploads.len(),
        saved_at: now,
        revision: doc.revision,
        submitted: doc.submitted_at.is_some(),
    })
}
