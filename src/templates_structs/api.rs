use serde::{Deserialize, Serialize};

use crate::models::response::{Entity, ResponseDocument};

/// Error body for every failed API call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// `GET /responses` body when a document exists.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResponseFound {
    pub found: bool,
    pub storage_path: String,
    #[serde(flatten)]
    pub document: ResponseDocument,
}

impl ResponseFound {
    pub fn new(storage_path: String, document: ResponseDocument) -> Self {
        ResponseFound {
            found: true,
            storage_path,
            document,
        }
    }
}

/// `GET /responses` body for an entity that has not saved anything yet.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResponseMissing {
    pub found: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub survey_type: String,
    pub company_id: String,
    pub employee_id: Option<String>,
    pub storage_path: String,
}

impl ResponseMissing {
    pub fn new(entity: &Entity, storage_path: String) -> Self {
        ResponseMissing {
            found: false,
            message: "No existing response found".to_string(),
            survey_type: entity.survey_type().as_str().to_string(),
            company_id: entity.company_id().to_string(),
            employee_id: entity.employee_id().map(str::to_string),
            storage_path,
        }
    }
}
