//! Shared test infrastructure for the survey integration tests.
//!
//! - `seeded_store()` - in-memory bucket with both question CSVs uploaded
//! - `test_app_state()` - handler state over a seeded store
//! - `temp_local_store()` - filesystem bucket under a temporary directory

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tempfile::TempDir;

use readiness_survey::handlers::AppState;
use readiness_survey::models::response::FileUpload;
use readiness_survey::storage::{LocalStore, MemoryStore, ObjectStore};

// ============================================================================
// TEST DATA
// ============================================================================

pub const COMPANY_CSV: &str = "id,question,type,required,options,section\n\
c1,What is your company size?,select,true,\"1-10;11-50;51-200;200+\",Company Information\n\
c2,Does your company use AI today?,radio,true,\"Yes;No\",Company Information\n\
c3,Describe your AI goals,textarea,false,,Strategy\n";

pub const EMPLOYEE_CSV: &str = "id,question,type,required,options,section\n\
e1,What is your role?,text,true,,About You\n\
e2,Which AI tools do you use?,checkbox,false,\"ChatGPT;Copilot;Other\",AI Experience\n\
e3,How comfortable are you with AI?,likert,true,,AI Experience\n\
e4,Anything else?,textarea,false,,Feedback\n";

// ============================================================================
// STORAGE SETUP
// ============================================================================

/// In-memory bucket with both question sets uploaded.
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .put("questions/company_questions.csv", COMPANY_CSV.as_bytes().to_vec(), "text/csv")
        .await
        .expect("seed company questions");
    store
        .put("questions/employee_questions.csv", EMPLOYEE_CSV.as_bytes().to_vec(), "text/csv")
        .await
        .expect("seed employee questions");
    store
}

/// Handler state over a freshly seeded in-memory bucket.
pub async fn test_app_state() -> (web::Data<AppState>, Arc<MemoryStore>) {
    let store = seeded_store().await;
    let state = web::Data::new(AppState::with_store(store.clone()));
    (state, store)
}

/// Filesystem bucket rooted in a temp dir. Keep the `TempDir` alive for the
/// duration of the test.
pub fn temp_local_store() -> (TempDir, Arc<LocalStore>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(LocalStore::new(dir.path().join("bucket")));
    (dir, store)
}

// ============================================================================
// REQUEST HELPERS
// ============================================================================

/// A base64-encoded attachment as a client would send it.
pub fn upload(name: &str, bytes: &[u8], content_type: &str) -> FileUpload {
    FileUpload {
        filename: name.to_string(),
        content: STANDARD.encode(bytes),
        content_type: content_type.to_string(),
        size: Some(bytes.len() as u64),
    }
}
