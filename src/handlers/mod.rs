pub mod api;
pub mod cors;
pub mod survey_page;

use actix_web::{
    App, HttpResponse, middleware, web,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
};
use std::sync::Arc;

use crate::config::{APP_NAME, AppConfig};
use crate::errors::AppError;
use crate::models::upload::UploadLimits;
use crate::storage::ObjectStore;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub app_name: String,
    pub store: Arc<dyn ObjectStore>,
    pub limits: UploadLimits,
    pub allowed_origin: String,
    pub json_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, config: &AppConfig) -> Self {
        AppState {
            app_name: APP_NAME.to_string(),
            store,
            limits: config.limits,
            allowed_origin: config.allowed_origin.clone(),
            json_limit: config.json_body_limit(),
        }
    }

    /// State with default limits, any origin allowed.
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        AppState {
            app_name: APP_NAME.to_string(),
            store,
            limits: UploadLimits::default(),
            allowed_origin: "*".to_string(),
            json_limit: 16 * 1024 * 1024,
        }
    }
}

/// Malformed JSON bodies become a `validation_error` on field `body`.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            AppError::validation("body", format!("Request body must be valid JSON: {err}")).into()
        })
}

/// Register the survey routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/questions", web::get().to(api::questions::list))
        .route("/responses", web::get().to(api::responses::read))
        .route("/responses", web::post().to(api::responses::save))
        .route("/survey/{survey_type}", web::get().to(survey_page::show))
        .route("/", web::get().to(|| async {
            HttpResponse::SeeOther()
                .insert_header(("Location", "/survey/company"))
                .finish()
        }));
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Route".to_string()))
}

/// The full application: routes, JSON limits, CORS and access logging.
pub fn app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let json_limit = state.json_limit;
    App::new()
        .app_data(state)
        .app_data(json_config(json_limit))
        .wrap(middleware::from_fn(cors::cors))
        .wrap(middleware::Logger::default())
        .configure(configure)
        // Default 404 handler (must be registered last)
        .default_service(web::to(not_found))
}
