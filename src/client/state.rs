use std::collections::{BTreeMap, BTreeSet};

use crate::models::question::{Question, SurveyType};
use crate::models::response::{Answer, ResponseDocument};
use crate::models::upload::UploadLimits;
use crate::storage::keys::normalize_id;
use super::files::PendingFile;

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Survey,
    Submitted,
}

/// User-facing feedback from the last transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved,
    SaveFailed(String),
    MissingRequired(Vec<String>),
    FileRejected(String),
    SubmitFailed(String),
}

/// Everything the survey UI renders from. Changed only through [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyState {
    pub screen: Screen,
    pub survey_type: SurveyType,
    pub company_id: String,
    pub employee_id: Option<String>,
    pub questions: Vec<Question>,
    pub answers: BTreeMap<String, Answer>,
    /// Answers the user removed since the last save; sent as explicit nulls.
    pub cleared: BTreeSet<String>,
    pub page: usize,
    pub page_size: usize,
    pub pending_files: Vec<PendingFile>,
    pub limits: UploadLimits,
    pub revision: Option<u64>,
    pub notice: Option<Notice>,
}

impl Default for SurveyState {
    fn default() -> Self {
        SurveyState {
            screen: Screen::Welcome,
            survey_type: SurveyType::Company,
            company_id: String::new(),
            employee_id: None,
            questions: Vec::new(),
            answers: BTreeMap::new(),
            cleared: BTreeSet::new(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            pending_files: Vec::new(),
            limits: UploadLimits::default(),
            revision: None,
            notice: None,
        }
    }
}

impl SurveyState {
    /// Fresh state for an entity; IDs are sanitized the same way the server
    /// normalizes them.
    pub fn new(survey_type: SurveyType, company_id: &str, employee_id: Option<&str>) -> Self {
        SurveyState {
            survey_type,
            company_id: normalize_id(company_id),
            employee_id: match survey_type {
                SurveyType::Company => None,
                SurveyType::Employee => employee_id.map(normalize_id).filter(|id| !id.is_empty()),
            },
            ..SurveyState::default()
        }
    }

    pub fn page_count(&self) -> usize {
        self.questions.len().div_ceil(self.page_size.max(1)).max(1)
    }

    fn page_range(&self, page: usize) -> std::ops::Range<usize> {
        let size = self.page_size.max(1);
        let start = (page * size).min(self.questions.len());
        let end = (start + size).min(self.questions.len());
        start..end
    }

    pub fn current_questions(&self) -> &[Question] {
        &self.questions[self.page_range(self.page)]
    }

    fn is_answered(&self, q: &Question) -> bool {
        self.answers.get(&q.id).is_some_and(Answer::is_answered)
    }

    pub fn missing_on_page(&self, page: usize) -> Vec<&Question> {
        self.questions[self.page_range(page)]
            .iter()
            .filter(|q| q.required && !self.is_answered(q))
            .collect()
    }

    pub fn missing_required(&self) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.required && !self.is_answered(q))
            .collect()
    }

    pub fn first_page_with_missing(&self) -> Option<usize> {
        let size = self.page_size.max(1);
        self.questions
            .iter()
            .position(|q| q.required && !self.is_answered(q))
            .map(|idx| idx / size)
    }

    /// Answered required questions as a percentage of all required ones.
    pub fn completion_percent(&self) -> u8 {
        let required: Vec<&Question> = self.questions.iter().filter(|q| q.required).collect();
        if required.is_empty() {
            return 100;
        }
        let answered = required.iter().filter(|q| self.is_answered(q)).count();
        ((answered * 100) / required.len()) as u8
    }

    pub fn is_last_page(&self) -> bool {
        self.page + 1 >= self.page_count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    QuestionsLoaded(Vec<Question>),
    DraftLoaded(ResponseDocument),
    Answered { question_id: String, answer: Option<Answer> },
    NextPage,
    PreviousPage,
    GoToPage(usize),
    FileAdded(PendingFile),
    FileRemoved(String),
    /// `cleared` lists the ids the save sent as nulls.
    Saved { revision: u64, cleared: Vec<String> },
    /// Background save; never produces a notice.
    Autosaved { revision: u64, cleared: Vec<String> },
    SaveFailed(String),
    Submitted { revision: u64, cleared: Vec<String> },
    Notify(Notice),
}

fn ids(questions: Vec<&Question>) -> Vec<String> {
    questions.into_iter().map(|q| q.id.clone()).collect()
}

/// The server has removed these; stop sending nulls for them.
fn forget_cleared(state: &mut SurveyState, sent: &[String]) {
    for id in sent {
        state.cleared.remove(id);
    }
}

/// Pure state transition.
pub fn reduce(mut state: SurveyState, action: Action) -> SurveyState {
    match action {
        Action::QuestionsLoaded(questions) => {
            state.questions = questions;
            state.page = 0;
            state.screen = Screen::Survey;
            state.notice = None;
        }
        Action::DraftLoaded(doc) => {
            // Answers typed before the draft arrived win over the stored ones.
            let mut answers = doc.responses;
            answers.append(&mut state.answers);
            answers.retain(|id, _| !state.cleared.contains(id));
            state.answers = answers;
            state.revision = Some(doc.revision);
        }
        Action::Answered { question_id, answer } => {
            match answer {
                Some(answer) => {
                    state.cleared.remove(&question_id);
                    state.answers.insert(question_id, answer);
                }
                None => {
                    state.answers.remove(&question_id);
                    state.cleared.insert(question_id);
                }
            }
            if matches!(state.notice, Some(Notice::MissingRequired(_))) {
                state.notice = None;
            }
        }
        Action::NextPage => {
            let missing = state.missing_on_page(state.page);
            if !missing.is_empty() {
                state.notice = Some(Notice::MissingRequired(ids(missing)));
            } else if !state.is_last_page() {
                state.page += 1;
                state.notice = None;
            }
        }
        Action::PreviousPage => {
            state.page = state.page.saturating_sub(1);
            state.notice = None;
        }
        Action::GoToPage(page) => {
            state.page = page.min(state.page_count() - 1);
        }
        Action::FileAdded(file) => {
            state.pending_files.push(file);
        }
        Action::FileRemoved(name) => {
            state.pending_files.retain(|f| f.name != name);
        }
        Action::Saved { revision, cleared } => {
            forget_cleared(&mut state, &cleared);
            state.revision = Some(revision);
            state.notice = Some(Notice::Saved);
        }
        Action::Autosaved { revision, cleared } => {
            forget_cleared(&mut state, &cleared);
            state.revision = Some(state.revision.map_or(revision, |r| r.max(revision)));
        }
        Action::SaveFailed(message) => {
            state.notice = Some(Notice::SaveFailed(message));
        }
        Action::Submitted { revision, cleared } => {
            forget_cleared(&mut state, &cleared);
            state.revision = Some(revision);
            state.pending_files.clear();
            state.screen = Screen::Submitted;
            state.notice = None;
        }
        Action::Notify(notice) => {
            state.notice = Some(notice);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionKind;

    fn question(id: &str, required: bool) -> Question {
        Question {
            id: id.to_string(),
            text: id.to_string(),
            kind: QuestionKind::Text,
            required,
            section: String::new(),
        }
    }

    fn loaded(n: usize, page_size: usize) -> SurveyState {
        let mut state = SurveyState::new(SurveyType::Company, "Acme Corp", None);
        state.page_size = page_size;
        let questions = (0..n).map(|i| question(&format!("q{i}"), i % 2 == 0)).collect();
        reduce(state, Action::QuestionsLoaded(questions))
    }

    fn answer(state: SurveyState, id: &str, value: &str) -> SurveyState {
        reduce(
            state,
            Action::Answered {
                question_id: id.to_string(),
                answer: Some(Answer::from(value)),
            },
        )
    }

    #[test]
    fn sanitizes_ids_and_enters_survey() {
        let state = loaded(7, 3);
        assert_eq!(state.company_id, "acme-corp");
        assert_eq!(state.screen, Screen::Survey);
        assert_eq!(state.page_count(), 3);
        assert_eq!(state.current_questions().len(), 3);
    }

    #[test]
    fn next_page_requires_current_page_answers() {
        let state = loaded(7, 3);
        let state = reduce(state, Action::NextPage);
        assert_eq!(state.page, 0);
        assert_eq!(
            state.notice,
            Some(Notice::MissingRequired(vec!["q0".into(), "q2".into()]))
        );

        let state = answer(answer(state, "q0", "a"), "q2", "b");
        assert!(state.notice.is_none());
        let state = reduce(state, Action::NextPage);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn completion_counts_required_only() {
        let state = loaded(4, 5);
        assert_eq!(state.completion_percent(), 0);
        let state = answer(state, "q1", "optional");
        assert_eq!(state.completion_percent(), 0);
        let state = answer(state, "q0", "x");
        assert_eq!(state.completion_percent(), 50);
        let state = answer(state, "q2", "   ");
        assert_eq!(state.completion_percent(), 50);
    }

    #[test]
    fn finds_first_page_with_missing_answer() {
        let state = loaded(7, 3);
        let state = answer(answer(answer(state, "q0", "a"), "q2", "b"), "q4", "c");
        assert_eq!(state.first_page_with_missing(), Some(2));
        assert_eq!(ids(state.missing_required()), ["q6"]);
    }

    #[test]
    fn draft_does_not_clobber_fresh_answers() {
        let state = answer(loaded(3, 5), "q0", "typed");
        let mut doc = ResponseDocument::empty(&crate::models::response::Entity::Company {
            company_id: "acme-corp".into(),
        });
        doc.responses.insert("q0".into(), Answer::from("stored"));
        doc.responses.insert("q1".into(), Answer::from("stored"));
        doc.revision = 4;

        let state = reduce(state, Action::DraftLoaded(doc));
        assert_eq!(state.answers["q0"], Answer::from("typed"));
        assert_eq!(state.answers["q1"], Answer::from("stored"));
        assert_eq!(state.revision, Some(4));
    }

    #[test]
    fn clearing_tracks_ids_until_saved() {
        let state = answer(loaded(3, 5), "q1", "a");
        let state = reduce(
            state,
            Action::Answered {
                question_id: "q1".into(),
                answer: None,
            },
        );
        assert!(!state.answers.contains_key("q1"));
        assert!(state.cleared.contains("q1"));

        let state = reduce(
            state,
            Action::Saved {
                revision: 2,
                cleared: vec!["q1".into()],
            },
        );
        assert!(state.cleared.is_empty());
    }

    #[test]
    fn draft_does_not_restore_cleared_answers() {
        let state = reduce(
            loaded(3, 5),
            Action::Answered {
                question_id: "q0".into(),
                answer: None,
            },
        );
        let mut doc = ResponseDocument::empty(&crate::models::response::Entity::Company {
            company_id: "acme-corp".into(),
        });
        doc.responses.insert("q0".into(), Answer::from("stored"));

        let state = reduce(state, Action::DraftLoaded(doc));
        assert!(!state.answers.contains_key("q0"));
    }

    #[test]
    fn blank_employee_id_is_dropped() {
        let state = SurveyState::new(SurveyType::Employee, "acme", Some(" !! "));
        assert_eq!(state.employee_id, None);
    }

    #[test]
    fn go_to_page_is_clamped() {
        let state = reduce(loaded(7, 3), Action::GoToPage(10));
        assert_eq!(state.page, 2);
        let state = reduce(state, Action::PreviousPage);
        assert_eq!(state.page, 1);
    }
}
