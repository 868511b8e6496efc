use actix_web::{HttpServer, web};

use readiness_survey::config::AppConfig;
use readiness_survey::handlers::{self, AppState};
use readiness_survey::models::question;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let store = config.build_store();
    log::info!("Using {} object storage", store.backend_name());

    // Seed question CSVs if a source directory is configured
    if let Some(dir) = &config.questions_dir {
        match question::seed_from_dir(store.as_ref(), dir).await {
            Ok(count) => log::info!("Seeded {} question files from {}", count, dir.display()),
            Err(e) => {
                log::error!("Question seeding failed: {e}");
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
            }
        }
    }

    let state = web::Data::new(AppState::new(store, &config));

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || handlers::app(state.clone()))
        .bind(&config.bind_addr)?
        .run()
        .await
}
