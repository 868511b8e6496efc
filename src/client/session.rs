use serde_json::{Map, Value};
use std::sync::Arc;

use crate::models::question::SurveyType;
use crate::models::response::{Answer, Entity, SaveConfirmation, SaveRequest};
use crate::models::upload::UploadLimits;
use super::api::{ClientError, SurveyApi};
use super::files::{self, FileRejection, PendingFile};
use super::state::{Action, Notice, Screen, SurveyState, reduce};

/// Which kind of save a request represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveKind {
    Auto,
    Page,
    Submit,
}

/// Question ids a save request deletes (sent as explicit nulls).
fn cleared_in(request: &SaveRequest) -> Vec<String> {
    match &request.responses {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| v.is_null())
            .map(|(k, _)| k.clone())
            .collect(),
        _ => Vec::new(),
    }
}

/// One user's pass through a survey: owns the state container and the API.
pub struct SurveySession<A: SurveyApi> {
    api: Arc<A>,
    state: SurveyState,
}

impl<A: SurveyApi> SurveySession<A> {
    /// IDs are normalized like the server does; an employee session whose
    /// `employee_id` normalizes to nothing is rejected by [`start`](Self::start).
    pub fn new(api: A, survey_type: SurveyType, company_id: &str, employee_id: Option<&str>) -> Self {
        SurveySession {
            api: Arc::new(api),
            state: SurveyState::new(survey_type, company_id, employee_id),
        }
    }

    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.state.limits = limits;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.state.page_size = page_size.max(1);
        self
    }

    pub fn state(&self) -> &SurveyState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Shared handle to the API, for sending without holding the session.
    pub fn api_handle(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    fn entity(&self) -> Result<Entity, ClientError> {
        if self.state.company_id.is_empty() {
            return Err(ClientError::Identity { field: "company_id" });
        }
        let company_id = self.state.company_id.clone();
        match (self.state.survey_type, &self.state.employee_id) {
            (SurveyType::Company, _) => Ok(Entity::Company { company_id }),
            (SurveyType::Employee, Some(employee_id)) => Ok(Entity::Employee {
                company_id,
                employee_id: employee_id.clone(),
            }),
            (SurveyType::Employee, None) => Err(ClientError::Identity { field: "employee_id" }),
        }
    }

    /// Load the questions, then seed answers from any saved draft. Only the
    /// question fetch is fatal. Nothing is fetched without a valid identity.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        let entity = self.entity()?;
        let questions = self.api.fetch_questions(self.state.survey_type).await?;
        self.dispatch(Action::QuestionsLoaded(questions));

        match self.api.fetch_response(&entity).await {
            Ok(Some(doc)) => {
                log::info!("Resuming draft with {} answers", doc.responses.len());
                self.dispatch(Action::DraftLoaded(doc));
            }
            Ok(None) => {}
            Err(e) => log::warn!("Could not load previous answers: {e}"),
        }
        Ok(())
    }

    /// Record an answer; `None` clears it, and the next save deletes it on
    /// the server too.
    pub fn answer(&mut self, question_id: &str, answer: Option<Answer>) {
        self.dispatch(Action::Answered {
            question_id: question_id.to_string(),
            answer,
        });
    }

    /// Advance when the current page is complete. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        let before = self.state.page;
        self.dispatch(Action::NextPage);
        self.state.page != before
    }

    pub fn previous_page(&mut self) {
        self.dispatch(Action::PreviousPage);
    }

    pub fn add_file(&mut self, file: PendingFile) -> Result<(), FileRejection> {
        if let Err(rejection) =
            files::validate_selection(&self.state.pending_files, &file, &self.state.limits)
        {
            self.dispatch(Action::Notify(Notice::FileRejected(rejection.to_string())));
            return Err(rejection);
        }
        self.dispatch(Action::FileAdded(file));
        Ok(())
    }

    pub fn remove_file(&mut self, name: &str) {
        self.dispatch(Action::FileRemoved(name.to_string()));
    }

    /// Current answers plus a null for every answer cleared since the last save.
    fn responses(&self) -> Value {
        let mut map = Map::new();
        for id in &self.state.cleared {
            map.insert(id.clone(), Value::Null);
        }
        for (id, answer) in &self.state.answers {
            if let Ok(value) = serde_json::to_value(answer) {
                map.insert(id.clone(), value);
            }
        }
        Value::Object(map)
    }

    fn request(&self, kind: SaveKind) -> Result<SaveRequest, ClientError> {
        let entity = self.entity()?;
        Ok(SaveRequest {
            survey_type: Some(entity.survey_type().as_str().to_string()),
            company_id: Some(entity.company_id().to_string()),
            employee_id: entity.employee_id().map(str::to_string),
            responses: Some(self.responses()),
            files: None,
            auto_save: kind == SaveKind::Auto,
            page_save: kind == SaveKind::Page,
            submitted: kind == SaveKind::Submit,
            expected_revision: None,
        })
    }

    /// Explicit save of the current answers, reported to the user.
    pub async fn save_page(&mut self) -> Result<SaveConfirmation, ClientError> {
        let result = match self.request(SaveKind::Page) {
            Ok(request) => self.api.save(&request).await.map(|c| (c, cleared_in(&request))),
            Err(e) => Err(e),
        };
        match result {
            Ok((confirmation, cleared)) => {
                self.dispatch(Action::Saved {
                    revision: confirmation.revision,
                    cleared,
                });
                Ok(confirmation)
            }
            Err(e) => {
                self.dispatch(Action::SaveFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// The request a background save would send, or `None` when there is
    /// nothing to save.
    pub fn autosave_request(&self) -> Option<SaveRequest> {
        if self.state.screen != Screen::Survey
            || (self.state.answers.is_empty() && self.state.cleared.is_empty())
        {
            return None;
        }
        match self.request(SaveKind::Auto) {
            Ok(request) => Some(request),
            Err(e) => {
                log::warn!("Autosave skipped: {e}");
                None
            }
        }
    }

    /// Apply the outcome of a background save. Failures are logged, never
    /// shown. Returns whether the save succeeded.
    pub fn finish_autosave(
        &mut self,
        request: &SaveRequest,
        result: Result<SaveConfirmation, ClientError>,
    ) -> bool {
        match result {
            Ok(confirmation) => {
                log::debug!("Autosaved revision {}", confirmation.revision);
                self.dispatch(Action::Autosaved {
                    revision: confirmation.revision,
                    cleared: cleared_in(request),
                });
                true
            }
            Err(e) => {
                log::warn!("Autosave failed: {e}");
                false
            }
        }
    }

    /// Best-effort background save. Returns whether anything was saved.
    pub async fn autosave(&mut self) -> bool {
        let Some(request) = self.autosave_request() else {
            return false;
        };
        let result = self.api.save(&request).await;
        self.finish_autosave(&request, result)
    }

    /// Validate every page, then send answers and attachments as the final
    /// submission. When a required answer is missing, the session jumps to
    /// its page and nothing is sent.
    pub async fn submit(&mut self) -> Result<SaveConfirmation, ClientError> {
        let missing: Vec<String> = self
            .state
            .missing_required()
            .into_iter()
            .map(|q| q.id.clone())
            .collect();
        if let Some(page) = self.state.first_page_with_missing() {
            self.dispatch(Action::GoToPage(page));
            self.dispatch(Action::Notify(Notice::MissingRequired(missing.clone())));
            return Err(ClientError::MissingRequired(missing));
        }

        let mut request = self.request(SaveKind::Submit)?;
        if !self.state.pending_files.is_empty() {
            request.files = Some(files::encode_all(&self.state.pending_files).await);
        }

        match self.api.save(&request).await {
            Ok(confirmation) => {
                self.dispatch(Action::Submitted {
                    revision: confirmation.revision,
                    cleared: cleared_in(&request),
                });
                Ok(confirmation)
            }
            Err(e) => {
                self.dispatch(Action::Notify(Notice::SubmitFailed(e.to_string())));
                Err(e)
            }
        }
    }
}
