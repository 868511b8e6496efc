use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::models::question::SurveyType;
use crate::storage::keys::validate_id;

/// A single answer: free text, a number (range/number widgets) or the
/// selected options of a multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Many(Vec<String>),
    Text(String),
    Number(serde_json::Number),
}

impl Answer {
    /// Whether the answer counts towards a required question.
    pub fn is_answered(&self) -> bool {
        match self {
            Answer::Text(s) => !s.trim().is_empty(),
            Answer::Many(items) => items.iter().any(|s| !s.trim().is_empty()),
            Answer::Number(_) => true,
        }
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Text(s.to_string())
    }
}

impl From<Vec<&str>> for Answer {
    fn from(items: Vec<&str>) -> Self {
        Answer::Many(items.into_iter().map(str::to_string).collect())
    }
}

/// Identity of one response document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entity {
    Company { company_id: String },
    Employee { company_id: String, employee_id: String },
}

impl Entity {
    /// Validate raw request fields into an entity, normalizing both IDs.
    /// `employee_id` is ignored for company surveys.
    pub fn resolve(
        survey_type: Option<&str>,
        company_id: Option<&str>,
        employee_id: Option<&str>,
    ) -> Result<Self, AppError> {
        let survey_type = parse_survey_type(survey_type)?;
        let company_id = validate_id("company_id", company_id)?;
        match survey_type {
            SurveyType::Company => Ok(Entity::Company { company_id }),
            SurveyType::Employee => Ok(Entity::Employee {
                company_id,
                employee_id: validate_id("employee_id", employee_id)?,
            }),
        }
    }

    pub fn survey_type(&self) -> SurveyType {
        match self {
            Entity::Company { .. } => SurveyType::Company,
            Entity::Employee { .. } => SurveyType::Employee,
        }
    }

    pub fn company_id(&self) -> &str {
        match self {
            Entity::Company { company_id } | Entity::Employee { company_id, .. } => company_id,
        }
    }

    pub fn employee_id(&self) -> Option<&str> {
        match self {
            Entity::Company { .. } => None,
            Entity::Employee { employee_id, .. } => Some(employee_id),
        }
    }
}

/// Parse the `type` field shared by every endpoint.
pub fn parse_survey_type(raw: Option<&str>) -> Result<SurveyType, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Err(AppError::validation(
            "type",
            "type is required (company or employee)",
        )),
        Some(s) => SurveyType::parse(s).ok_or_else(|| {
            AppError::validation("type", format!("type must be company or employee, got '{s}'"))
        }),
    }
}

/// How the last save was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    #[default]
    Manual,
    Auto,
    Page,
    Submit,
}

impl SaveMode {
    pub fn from_flags(auto_save: bool, page_save: bool, submitted: bool) -> Self {
        if submitted {
            SaveMode::Submit
        } else if page_save {
            SaveMode::Page
        } else if auto_save {
            SaveMode::Auto
        } else {
            SaveMode::Manual
        }
    }
}

/// Metadata of a stored attachment; the bytes live under the entity's `files/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// The persisted JSON document for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDocument {
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub responses: BTreeMap<String, Answer>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_save: SaveMode,
    #[serde(default)]
    pub revision: u64,
}

impl ResponseDocument {
    pub fn empty(entity: &Entity) -> Self {
        ResponseDocument {
            survey_type: entity.survey_type(),
            company_id: entity.company_id().to_string(),
            employee_id: entity.employee_id().map(str::to_string),
            responses: BTreeMap::new(),
            files: Vec::new(),
            submitted_at: None,
            created_at: None,
            updated_at: None,
            last_save: SaveMode::Manual,
            revision: 0,
        }
    }
}

/// One attachment as sent by the client, content base64-encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileUpload {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Body of `POST /responses`. Identifying fields stay optional here so that
/// validation can name the missing field instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub survey_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub responses: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileUpload>>,
    #[serde(default)]
    pub auto_save: bool,
    #[serde(default)]
    pub page_save: bool,
    #[serde(default)]
    pub submitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_revision: Option<u64>,
}

/// Returned by a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveConfirmation {
    pub message: String,
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub company_id: String,
    pub employee_id: Option<String>,
    pub uploaded_files: usize,
    pub saved_at: DateTime<Utc>,
    pub revision: u64,
    pub submitted: bool,
}
