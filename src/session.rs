//! One user's run of the grade form.
//!
//! [`SessionState`] holds the four current selections. [`Session`] owns that
//! state together with the remote store and turns each [`FormCommand`] into
//! an [`Outcome`]; failures never escape as panics or early returns, they
//! become [`Outcome::Failed`].

use tracing::{info, warn};

use crate::averages::{AverageRow, weighted_averages};
use crate::command::FormCommand;
use crate::error::AppError;
use crate::model::{Score, ScoreEntry, Semester, TestType};
use crate::services::{ScoreStore, SubjectCatalog};

/// The current form selections.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub subject: String,
    pub test_type: TestType,
    pub semester: Semester,
    pub score: Score,
}

impl SessionState {
    /// Defaults: first catalog entry (or none), the first test type, the
    /// first semester and a score of zero.
    pub fn new(subjects: &[String]) -> Self {
        Self {
            subject: subjects.first().cloned().unwrap_or_default(),
            test_type: TestType::default(),
            semester: Semester::default(),
            score: Score::default(),
        }
    }
}

/// Result of handling one command, ready to be rendered.
#[derive(Debug)]
pub enum Outcome {
    Selection(SessionState),
    Subjects(Vec<String>),
    Recorded(ScoreEntry),
    Averages(Vec<AverageRow>),
    /// The score log holds no records yet.
    NoData,
    Help,
    Failed(AppError),
    Quit,
}

pub struct Session<S> {
    store: S,
    subjects: Vec<String>,
    state: SessionState,
}

impl<S: ScoreStore + SubjectCatalog> Session<S> {
    /// Loads the subject catalog and applies the default selections.
    ///
    /// A catalog failure does not stop the session: it continues with an
    /// empty catalog and the error is handed back to be shown once.
    pub async fn start(store: S) -> (Self, Option<AppError>) {
        let (subjects, warning) = match store.subjects().await {
            Ok(subjects) => {
                info!(subjects = subjects.len(), "Subject catalog loaded");
                (subjects, None)
            }
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "Subject catalog unavailable");
                (Vec::new(), Some(e))
            }
        };

        let state = SessionState::new(&subjects);
        let session = Self {
            store,
            subjects,
            state,
        };
        (session, warning)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Selects a catalog subject. An exact match wins; otherwise a
    /// case-insensitive match is accepted.
    pub fn select_subject(&mut self, name: &str) -> Result<(), AppError> {
        let name = name.trim();
        let lowered = name.to_lowercase();

        let found = self
            .subjects
            .iter()
            .find(|s| s.as_str() == name)
            .or_else(|| self.subjects.iter().find(|s| s.to_lowercase() == lowered))
            .ok_or_else(|| {
                if self.subjects.is_empty() {
                    AppError::Input("the subject catalog is empty".into())
                } else {
                    AppError::Input(format!(
                        "'{name}' is not in the subject catalog (see 'subjects')"
                    ))
                }
            })?;

        self.state.subject = found.clone();
        Ok(())
    }

    pub fn select_test_type(&mut self, test_type: TestType) {
        self.state.test_type = test_type;
    }

    pub fn select_semester(&mut self, semester: Semester) {
        self.state.semester = semester;
    }

    pub fn set_score(&mut self, score: Score) {
        self.state.score = score;
    }

    /// Appends the current selections to the score log, with the weight
    /// taken from the selected test type.
    pub async fn record(&self) -> Result<ScoreEntry, AppError> {
        let state = &self.state;
        if state.subject.is_empty() {
            return Err(AppError::Input("no subject selected".into()));
        }

        let entry = ScoreEntry::new(state.semester, &state.subject, state.test_type, state.score);
        self.store.append(&entry).await?;

        info!(
            semester = %entry.semester,
            subject = %entry.subject,
            test_type = %entry.test_type,
            score = %entry.score,
            weight = entry.weight,
            "Score recorded"
        );
        Ok(entry)
    }

    /// Reads the whole score log and reduces it to weighted averages.
    /// An empty log yields no rows.
    pub async fn compute_averages(&self) -> Result<Vec<AverageRow>, AppError> {
        let records = self.store.read_all().await?;
        let rows = weighted_averages(&records);

        info!(records = records.len(), groups = rows.len(), "Averages computed");
        Ok(rows)
    }

    /// Runs one command against the session.
    pub async fn handle(&mut self, command: FormCommand) -> Outcome {
        let result = match command {
            FormCommand::Subject(name) => self
                .select_subject(&name)
                .map(|()| Outcome::Selection(self.state.clone())),
            FormCommand::TestType(test_type) => {
                self.select_test_type(test_type);
                Ok(Outcome::Selection(self.state.clone()))
            }
            FormCommand::Semester(semester) => {
                self.select_semester(semester);
                Ok(Outcome::Selection(self.state.clone()))
            }
            FormCommand::Score(score) => {
                self.set_score(score);
                Ok(Outcome::Selection(self.state.clone()))
            }
            FormCommand::Record => self.record().await.map(Outcome::Recorded),
            FormCommand::Averages => self.compute_averages().await.map(|rows| {
                if rows.is_empty() {
                    Outcome::NoData
                } else {
                    Outcome::Averages(rows)
                }
            }),
            FormCommand::Show => Ok(Outcome::Selection(self.state.clone())),
            FormCommand::Subjects => Ok(Outcome::Subjects(self.subjects.clone())),
            FormCommand::Help => Ok(Outcome::Help),
            FormCommand::Quit => Ok(Outcome::Quit),
        };

        result.unwrap_or_else(|e| {
            warn!(kind = ?e.kind(), error = %e, "Action failed");
            Outcome::Failed(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::ScoreRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSheet {
        subjects: Vec<String>,
        rows: Mutex<Vec<ScoreRecord>>,
        offline: bool,
    }

    #[async_trait]
    impl SubjectCatalog for FakeSheet {
        async fn subjects(&self) -> Result<Vec<String>, AppError> {
            if self.offline {
                return Err(AppError::Connection("offline".into()));
            }
            Ok(self.subjects.clone())
        }
    }

    #[async_trait]
    impl ScoreStore for FakeSheet {
        async fn append(&self, entry: &ScoreEntry) -> Result<(), AppError> {
            if self.offline {
                return Err(AppError::Write("offline".into()));
            }
            self.rows.lock().unwrap().push(ScoreRecord::from(entry));
            Ok(())
        }

        async fn read_all(&self) -> Result<Vec<ScoreRecord>, AppError> {
            if self.offline {
                return Err(AppError::Connection("offline".into()));
            }
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn sheet(subjects: &[&str]) -> FakeSheet {
        FakeSheet {
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_state_defaults() {
        let state = SessionState::new(&["Math".to_string(), "Physics".to_string()]);

        assert_eq!(state.subject, "Math");
        assert_eq!(state.test_type, TestType::Regular);
        assert_eq!(state.semester, Semester::TermI);
        assert_eq!(state.score.value(), 0.0);

        assert_eq!(SessionState::new(&[]).subject, "");
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_empty_catalog() {
        let fake = FakeSheet {
            offline: true,
            ..sheet(&["Math"])
        };

        let (session, warning) = Session::start(fake).await;

        assert_eq!(warning.map(|e| e.kind()), Some(ErrorKind::Connection));
        assert!(session.subjects().is_empty());
        assert_eq!(session.state().subject, "");
    }

    #[tokio::test]
    async fn test_select_subject_is_case_insensitive() {
        let (mut session, _) = Session::start(sheet(&["Math", "Physics"])).await;

        session.select_subject("physics").unwrap();
        assert_eq!(session.state().subject, "Physics");

        let err = session.select_subject("Biology").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(session.state().subject, "Physics");
    }

    #[tokio::test]
    async fn test_record_final_writes_weight_two() {
        let (mut session, _) = Session::start(sheet(&["Math"])).await;
        session.select_test_type(TestType::Final);
        session.set_score(Score::new(9.0).unwrap());

        let entry = session.record().await.unwrap();

        assert_eq!(entry.weight, 2);
        let rows = session.store.rows.lock().unwrap().clone();
        assert_eq!(rows, vec![ScoreRecord::new("Term I", "Math", "Final", 9.0, 2.0)]);
    }

    #[tokio::test]
    async fn test_record_without_subject_is_rejected() {
        let (session, _) = Session::start(sheet(&[])).await;

        let err = session.record().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(session.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_averages_on_empty_log_is_no_data() {
        let (mut session, _) = Session::start(sheet(&["Math"])).await;

        assert!(matches!(session.handle(FormCommand::Averages).await, Outcome::NoData));
    }

    #[tokio::test]
    async fn test_handle_write_failure_keeps_state() {
        let fake = FakeSheet {
            offline: true,
            ..Default::default()
        };
        let (mut session, _) = Session::start(fake).await;
        session.state.subject = "Math".into();
        let before = session.state().clone();

        let outcome = session.handle(FormCommand::Record).await;

        match outcome {
            Outcome::Failed(e) => assert_eq!(e.kind(), ErrorKind::Write),
            other => panic!("expected a write failure, got {other:?}"),
        }
        assert_eq!(session.state(), &before);
    }

    #[tokio::test]
    async fn test_handle_selection_updates_state() {
        let (mut session, _) = Session::start(sheet(&["Math"])).await;

        session.handle(FormCommand::Semester(Semester::TermII)).await;
        let outcome = session.handle(FormCommand::TestType(TestType::TermExam)).await;

        match outcome {
            Outcome::Selection(state) => {
                assert_eq!(state.semester, Semester::TermII);
                assert_eq!(state.test_type, TestType::TermExam);
            }
            other => panic!("expected a selection, got {other:?}"),
        }
    }
}
