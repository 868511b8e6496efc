use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::api::SurveyApi;
use super::session::SurveySession;
use super::state::Screen;

pub const DEFAULT_AUTOSAVE_PERIOD: Duration = Duration::from_secs(30);

/// Periodically autosave a shared session until it has been submitted.
///
/// The session lock is held only while the request is built and while the
/// outcome is applied, not during the network round-trip.
pub fn spawn_autosave<A: SurveyApi + 'static>(
    session: Arc<Mutex<SurveySession<A>>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (api, request) = {
                let guard = session.lock().await;
                if guard.state().screen == Screen::Submitted {
                    log::debug!("Survey submitted, stopping autosave");
                    break;
                }
                match guard.autosave_request() {
                    Some(request) => (guard.api_handle(), request),
                    None => continue,
                }
            };
            let result = api.save(&request).await;
            session.lock().await.finish_autosave(&request, result);
        }
    })
}
