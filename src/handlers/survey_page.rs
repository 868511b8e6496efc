use actix_web::{web, HttpResponse};
use askama::Template;

use crate::errors::{AppError, render};
use crate::handlers::AppState;
use crate::models::question::{self, SurveyType};
use crate::templates_structs::{NotFoundTemplate, SurveyPageTemplate};

fn not_found_page(state: &AppState, message: String) -> Result<HttpResponse, AppError> {
    let tmpl = NotFoundTemplate {
        app_name: state.app_name.clone(),
        message,
    };
    Ok(HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(tmpl.render()?))
}

/// GET /survey/{survey_type}
/// Read-only preview of a question set, grouped by section.
pub async fn show(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw = path.into_inner();
    let Some(survey_type) = SurveyType::parse(&raw) else {
        return not_found_page(&state, format!("There is no '{raw}' survey."));
    };

    match question::load(state.store.as_ref(), survey_type).await {
        Ok(questions) => render(SurveyPageTemplate::new(&state.app_name, survey_type, &questions)),
        Err(AppError::NotFound(_)) => not_found_page(
            &state,
            format!("No questions have been published for the {survey_type} survey yet."),
        ),
        Err(e) => Err(e),
    }
}
