//! Survey client logic: paging, validation, file selection and the save
//! cycle, independent of any particular UI.

pub mod api;
pub mod autosave;
pub mod files;
pub mod session;
pub mod state;

pub use api::{ClientError, HttpSurveyApi, InProcessApi, SurveyApi};
pub use autosave::{DEFAULT_AUTOSAVE_PERIOD, spawn_autosave};
pub use files::{FileRejection, PendingFile};
pub use session::SurveySession;
pub use state::{Action, Notice, Screen, SurveyState, reduce};
