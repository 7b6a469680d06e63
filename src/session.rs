// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Analysis session state machine
//!
//! One upload-to-result cycle: `Idle → FilesSelected → Processing →
//! Results | Error`. The session never performs I/O itself. `submit` hands
//! out a [`PendingAnalysis`] carrying a [`Ticket`]; whoever runs the request
//! feeds the outcome back through [`AnalysisSession::resolve`], which applies
//! it only if the session is still waiting on that exact ticket.

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::context::SessionContext;
use crate::error::CollaboratorError;
use crate::language::LanguageCode;
use crate::model::{AnalysisRequest, AnalysisResult, FileBatch};

/// Message shown when the service fails without saying why
pub const ANALYSIS_FALLBACK: &str = "Failed to process files";

/// Default wait before the feedback prompt opens after results appear
pub const FEEDBACK_OPEN_DELAY: Duration = Duration::from_millis(1500);

/// Exactly one of these is active at a time
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    FilesSelected(FileBatch),
    Processing(FileBatch),
    Results(AnalysisResult),
    Error(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FilesSelected(_) => "files-selected",
            Self::Processing(_) => "processing",
            Self::Results(_) => "results",
            Self::Error(_) => "error",
        }
    }
}

/// Identifies the request a `Processing` session is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request the caller must run and then resolve
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnalysis {
    pub ticket: Ticket,
    pub request: AnalysisRequest,
}

/// What `resolve` did with an outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Entered `Results`. `feedback_after` is set when the feedback prompt
    /// should open after that delay.
    Completed { feedback_after: Option<Duration> },
    /// Entered `Error`
    Failed { message: String },
    /// The session moved on; the outcome was dropped
    Stale,
}

#[derive(Debug)]
pub struct AnalysisSession {
    state: SessionState,
    next_ticket: u64,
    in_flight: Option<Ticket>,
    /// Batch of the last submission, kept so an `Error` can be retried
    retained: Option<FileBatch>,
    feedback_delay: Duration,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::with_feedback_delay(FEEDBACK_OPEN_DELAY)
    }

    pub fn with_feedback_delay(feedback_delay: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            next_ticket: 1,
            in_flight: None,
            retained: None,
            feedback_delay,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Ticket of the request currently awaited, if any
    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, SessionState::Processing(_))
    }

    pub fn results(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Results(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Start a new session with a validated batch.
    ///
    /// Prior results or errors are discarded immediately. Selecting while
    /// `Processing` abandons the in-flight request.
    pub fn select_files(&mut self, batch: FileBatch) {
        if let Some(ticket) = self.in_flight.take() {
            info!("Abandoning analysis {} for a new selection", ticket);
        }
        debug!("Selected {} file(s) (was {})", batch.len(), self.state.name());
        self.retained = None;
        self.state = SessionState::FilesSelected(batch);
    }

    /// Move to `Processing` and hand out the request to run.
    ///
    /// Allowed from `FilesSelected`, and from `Error` as a retry of the last
    /// batch. Anywhere else, `Processing` included, this does nothing.
    pub fn submit(&mut self, language: LanguageCode, token: Option<&str>) -> Option<PendingAnalysis> {
        let batch = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::FilesSelected(batch) => batch,
            SessionState::Error(message) => match self.retained.clone() {
                Some(batch) => {
                    info!("Retrying analysis after error: {}", message);
                    batch
                }
                None => {
                    self.state = SessionState::Error(message);
                    return None;
                }
            },
            other => {
                debug!("Ignoring submit while {}", other.name());
                self.state = other;
                return None;
            }
        };

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.retained = Some(batch.clone());
        self.state = SessionState::Processing(batch.clone());

        info!("Submitting analysis {} ({} file(s), language {})", ticket, batch.len(), language);

        Some(PendingAnalysis {
            ticket,
            request: AnalysisRequest {
                files: batch,
                language,
                auth_token: token.map(String::from),
            },
        })
    }

    /// Apply the outcome of a request, unless the session has moved on
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, CollaboratorError>,
        context: &mut SessionContext,
    ) -> Resolution {
        if self.in_flight != Some(ticket) || !self.is_processing() {
            debug!("Discarding stale response for analysis {}", ticket);
            return Resolution::Stale;
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                info!(
                    "Analysis {} complete: {} categories, {} articles",
                    ticket,
                    result.categories.len(),
                    result.article_count()
                );
                self.retained = None;
                self.state = SessionState::Results(result);
                let feedback_after = context
                    .claim_feedback_offer()
                    .then_some(self.feedback_delay);
                Resolution::Completed { feedback_after }
            }
            Err(e) => {
                let message = e.message(ANALYSIS_FALLBACK);
                warn!("Analysis {} failed: {}", ticket, message);
                self.state = SessionState::Error(message.clone());
                Resolution::Failed { message }
            }
        }
    }

    /// Back to `Idle` ("new analysis"); any in-flight request becomes stale
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            info!("Abandoning analysis {} on reset", ticket);
        }
        self.retained = None;
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{validate, CandidateFile};
    use crate::model::{AnalysisMetadata, Category, CategoryResult};

    fn batch(names: &[&str]) -> FileBatch {
        validate(names.iter().map(|n| CandidateFile::new(*n, 10, None)))
            .unwrap()
            .batch
    }

    fn result(category: &str) -> AnalysisResult {
        AnalysisResult {
            categories: vec![Category {
                name: category.to_string(),
                result: CategoryResult::default(),
            }],
            metadata: AnalysisMetadata::default(),
        }
    }

    fn failure(detail: &str) -> CollaboratorError {
        CollaboratorError::Rejected { status: 500, detail: Some(detail.to_string()) }
    }

    #[test]
    fn test_happy_path() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        assert_eq!(session.state(), &SessionState::Idle);

        session.select_files(batch(&["a.pdf"]));
        assert!(matches!(session.state(), SessionState::FilesSelected(_)));

        let pending = session.submit(LanguageCode::Fr, Some("tok")).unwrap();
        assert!(session.is_processing());
        assert_eq!(pending.request.language, LanguageCode::Fr);
        assert_eq!(pending.request.auth_token.as_deref(), Some("tok"));
        assert_eq!(pending.request.files.len(), 1);

        let resolution = session.resolve(pending.ticket, Ok(result("Technology")), &mut context);
        assert_eq!(resolution, Resolution::Completed { feedback_after: Some(FEEDBACK_OPEN_DELAY) });
        assert_eq!(session.results().unwrap().category_names(), vec!["Technology"]);
        assert!(session.in_flight().is_none());
    }

    #[test]
    fn test_every_language_is_captured_at_submit() {
        for code in LanguageCode::ALL {
            let mut session = AnalysisSession::new();
            session.select_files(batch(&["a.txt"]));
            let pending = session.submit(code, None).unwrap();
            assert_eq!(pending.request.language, code);
            assert!(pending.request.auth_token.is_none());
        }
    }

    #[test]
    fn test_submit_while_processing_is_noop() {
        let mut session = AnalysisSession::new();
        session.select_files(batch(&["a.pdf"]));
        let first = session.submit(LanguageCode::En, None).unwrap();
        let before = session.state().clone();

        assert!(session.submit(LanguageCode::De, None).is_none());
        assert_eq!(session.state(), &before);
        assert_eq!(session.in_flight(), Some(first.ticket));
    }

    #[test]
    fn test_submit_from_idle_or_results_is_noop() {
        let mut session = AnalysisSession::new();
        assert!(session.submit(LanguageCode::En, None).is_none());
        assert_eq!(session.state(), &SessionState::Idle);

        let mut context = SessionContext::in_memory();
        session.select_files(batch(&["a.pdf"]));
        let pending = session.submit(LanguageCode::En, None).unwrap();
        session.resolve(pending.ticket, Ok(result("Sports")), &mut context);
        assert!(session.submit(LanguageCode::En, None).is_none());
        assert!(session.results().is_some());
    }

    #[test]
    fn test_stale_response_after_new_selection() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        session.select_files(batch(&["old.pdf"]));
        let old = session.submit(LanguageCode::En, None).unwrap();

        let fresh = batch(&["new.mp4"]);
        session.select_files(fresh.clone());

        let resolution = session.resolve(old.ticket, Ok(result("Politics")), &mut context);
        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(session.state(), &SessionState::FilesSelected(fresh));

        // Nor can a late failure overwrite the next Processing state
        let next = session.submit(LanguageCode::En, None).unwrap();
        assert_eq!(session.resolve(old.ticket, Err(failure("late")), &mut context), Resolution::Stale);
        assert!(session.is_processing());
        assert_eq!(session.in_flight(), Some(next.ticket));
    }

    #[test]
    fn test_stale_response_after_reset() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        session.select_files(batch(&["a.pdf"]));
        let pending = session.submit(LanguageCode::En, None).unwrap();
        session.reset();

        assert_eq!(session.resolve(pending.ticket, Ok(result("X")), &mut context), Resolution::Stale);
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_failure_surfaces_detail_and_reset_returns_idle() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        session.select_files(batch(&["a.pdf"]));
        let pending = session.submit(LanguageCode::En, None).unwrap();

        let resolution = session.resolve(pending.ticket, Err(failure("model unavailable")), &mut context);
        assert_eq!(resolution, Resolution::Failed { message: "model unavailable".into() });
        assert_eq!(session.state(), &SessionState::Error("model unavailable".into()));

        session.reset();
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_failure_without_detail_uses_fallback() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        session.select_files(batch(&["a.pdf"]));
        let pending = session.submit(LanguageCode::En, None).unwrap();

        let err = CollaboratorError::Rejected { status: 502, detail: None };
        session.resolve(pending.ticket, Err(err), &mut context);
        assert_eq!(session.error(), Some(ANALYSIS_FALLBACK));
    }

    #[test]
    fn test_error_can_be_retried_with_same_batch() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        let files = batch(&["a.pdf", "b.wav"]);
        session.select_files(files.clone());
        let first = session.submit(LanguageCode::En, None).unwrap();
        session.resolve(first.ticket, Err(failure("busy")), &mut context);

        let retry = session.submit(LanguageCode::Es, None).unwrap();
        assert_ne!(retry.ticket, first.ticket);
        assert_eq!(retry.request.files, files);
        assert_eq!(retry.request.language, LanguageCode::Es);
    }

    #[test]
    fn test_new_selection_discards_results() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        session.select_files(batch(&["a.pdf"]));
        let pending = session.submit(LanguageCode::En, None).unwrap();
        session.resolve(pending.ticket, Ok(result("Health")), &mut context);

        session.select_files(batch(&["b.pdf"]));
        assert!(session.results().is_none());
        assert!(matches!(session.state(), SessionState::FilesSelected(_)));
    }

    #[test]
    fn test_feedback_offered_only_on_first_success() {
        let mut session = AnalysisSession::with_feedback_delay(Duration::from_millis(10));
        let mut context = SessionContext::in_memory();

        for expected in [Some(Duration::from_millis(10)), None] {
            session.select_files(batch(&["a.pdf"]));
            let pending = session.submit(LanguageCode::En, None).unwrap();
            let resolution = session.resolve(pending.ticket, Ok(result("Science")), &mut context);
            assert_eq!(resolution, Resolution::Completed { feedback_after: expected });
        }
    }

    #[test]
    fn test_no_feedback_when_already_reviewed() {
        let mut session = AnalysisSession::new();
        let mut context = SessionContext::in_memory();
        context.mark_reviewed();

        session.select_files(batch(&["a.pdf"]));
        let pending = session.submit(LanguageCode::En, None).unwrap();
        let resolution = session.resolve(pending.ticket, Ok(result("Science")), &mut context);
        assert_eq!(resolution, Resolution::Completed { feedback_after: None });
    }
}
