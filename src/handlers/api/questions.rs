use actix_web::{web, HttpResponse};
use std::collections::HashMap;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::question::{self, QuestionSet};
use crate::models::response::parse_survey_type;

/// GET /questions?type=company|employee
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let survey_type = parse_survey_type(query.get("type").map(String::as_str))?;

    let questions = question::load(state.store.as_ref(), survey_type).await?;
    log::info!("Serving {} {} questions", questions.len(), survey_type);

    Ok(HttpResponse::Ok().json(QuestionSet::new(survey_type, questions)))
}
