use actix_web::ResponseError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;

use crate::models::question::{self, Question, QuestionSet, SurveyType};
use crate::models::response::{self, Entity, ResponseDocument, SaveConfirmation, SaveRequest};
use crate::models::upload::UploadLimits;
use crate::storage::ObjectStore;
use crate::templates_structs::ApiErrorResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    Transport(String),
    /// The server answered with an error status.
    Api { status: u16, message: String },
    /// Submission blocked locally; carries the unanswered question ids.
    MissingRequired(Vec<String>),
    /// The session has no usable company or employee id.
    Identity { field: &'static str },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "Could not reach the survey service: {e}"),
            ClientError::Api { status, message } => write!(f, "{message} (HTTP {status})"),
            ClientError::MissingRequired(ids) => {
                write!(f, "Please answer all required questions ({})", ids.join(", "))
            }
            ClientError::Identity { field } => write!(f, "A valid {field} is required"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

/// The three calls the survey client makes.
#[async_trait]
pub trait SurveyApi: Send + Sync {
    async fn fetch_questions(&self, survey_type: SurveyType) -> Result<Vec<Question>, ClientError>;

    /// `Ok(None)` when the entity has never saved.
    async fn fetch_response(&self, entity: &Entity) -> Result<Option<ResponseDocument>, ClientError>;

    async fn save(&self, request: &SaveRequest) -> Result<SaveConfirmation, ClientError>;
}

/// Talks to a running survey service over HTTP.
pub struct HttpSurveyApi {
    base_url: String,
    client: Client,
}

impl HttpSurveyApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpSurveyApi {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let message = match resp.json::<ApiErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => "Unexpected response from the survey service".to_string(),
    };
    ClientError::Api { status, message }
}

#[async_trait]
impl SurveyApi for HttpSurveyApi {
    async fn fetch_questions(&self, survey_type: SurveyType) -> Result<Vec<Question>, ClientError> {
        let resp = self
            .client
            .get(self.url("/questions"))
            .query(&[("type", survey_type.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(resp.json::<QuestionSet>().await?.questions)
    }

    async fn fetch_response(&self, entity: &Entity) -> Result<Option<ResponseDocument>, ClientError> {
        let mut query = vec![
            ("type", entity.survey_type().as_str()),
            ("company_id", entity.company_id()),
        ];
        if let Some(employee_id) = entity.employee_id() {
            query.push(("employee_id", employee_id));
        }
        let resp = self
            .client
            .get(self.url("/responses"))
            .query(&query)
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp.json::<ResponseDocument>().await?)),
            _ => Err(api_error(resp).await),
        }
    }

    async fn save(&self, request: &SaveRequest) -> Result<SaveConfirmation, ClientError> {
        let resp = self
            .client
            .post(self.url("/responses"))
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(resp.json::<SaveConfirmation>().await?)
    }
}

/// Calls the question and response stores directly, without HTTP.
pub struct InProcessApi {
    store: Arc<dyn ObjectStore>,
    limits: UploadLimits,
}

impl InProcessApi {
    pub fn new(store: Arc<dyn ObjectStore>, limits: UploadLimits) -> Self {
        InProcessApi { store, limits }
    }
}

fn to_client_error(e: crate::errors::AppError) -> ClientError {
    ClientError::Api {
        status: e.status_code().as_u16(),
        message: e.to_string(),
    }
}

#[async_trait]
impl SurveyApi for InProcessApi {
    async fn fetch_questions(&self, survey_type: SurveyType) -> Result<Vec<Question>, ClientError> {
        question::load(self.store.as_ref(), survey_type)
            .await
            .map_err(to_client_error)
    }

    async fn fetch_response(&self, entity: &Entity) -> Result<Option<ResponseDocument>, ClientError> {
        response::find(self.store.as_ref(), entity)
            .await
            .map_err(to_client_error)
    }

    async fn save(&self, request: &SaveRequest) -> Result<SaveConfirmation, ClientError> {
        response::save(self.store.as_ref(), request, &self.limits)
            .await
            .map_err(to_client_error)
    }
}
