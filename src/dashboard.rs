// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Dashboard: drives one user's analysis sessions against the backends
//!
//! Wires the language selection, intake, analysis session, renderer and
//! feedback gate together. `analyze` runs a submission to completion; an
//! event loop that wants to keep reacting while the request is in flight can
//! use `begin_analysis` / `finish_analysis` instead.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::client::{AnalysisBackend, ReviewBackend};
use crate::config::AppConfig;
use crate::context::SessionContext;
use crate::error::{CollaboratorError, ValidationError};
use crate::feedback::{FeedbackGate, FeedbackOutcome};
use crate::intake::{self, CandidateFile, Intake};
use crate::language::{LanguageCode, LanguageSelection};
use crate::model::AnalysisResult;
use crate::render::{ResultRenderer, ResultView};
use crate::session::{AnalysisSession, PendingAnalysis, Resolution, SessionState, Ticket};

pub struct Dashboard<B: ?Sized> {
    backend: Arc<B>,
    session: AnalysisSession,
    language: LanguageSelection,
    renderer: ResultRenderer,
    feedback: FeedbackGate,
    context: SessionContext,
    feedback_enabled: bool,
    /// Delay after which the feedback gate should open, once scheduled
    feedback_due: Option<Duration>,
}

impl<B> Dashboard<B>
where
    B: AnalysisBackend + ReviewBackend + ?Sized,
{
    pub fn new(backend: Arc<B>, context: SessionContext, config: &AppConfig) -> Self {
        Self {
            backend,
            session: AnalysisSession::with_feedback_delay(config.feedback.open_delay()),
            language: LanguageSelection::new(config.language),
            renderer: ResultRenderer::new(),
            feedback: FeedbackGate::from_config(&config.feedback),
            context,
            feedback_enabled: config.feedback.enabled,
            feedback_due: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn language(&self) -> LanguageCode {
        self.language.current()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn feedback(&self) -> &FeedbackGate {
        &self.feedback
    }

    pub fn into_context(self) -> SessionContext {
        self.context
    }

    pub fn set_language(&mut self, raw: &str) -> Result<LanguageCode, ValidationError> {
        self.language.select(raw)
    }

    /// Validate candidates and start a new session with what survives
    pub fn select(&mut self, candidates: Vec<CandidateFile>) -> Result<Intake, ValidationError> {
        let intake = intake::validate(candidates)?;
        self.session.select_files(intake.batch.clone());
        self.renderer = ResultRenderer::new();
        self.feedback_due = None;
        Ok(intake)
    }

    /// Submit the current selection; `None` when the session is not ready
    pub fn begin_analysis(&mut self) -> Option<PendingAnalysis> {
        self.session
            .submit(self.language.current(), self.context.bearer())
    }

    pub fn finish_analysis(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, CollaboratorError>,
    ) -> Resolution {
        let resolution = self.session.resolve(ticket, outcome, &mut self.context);
        if let Resolution::Completed { feedback_after } = &resolution {
            self.renderer = ResultRenderer::new();
            if self.feedback_enabled {
                self.feedback_due = *feedback_after;
            }
        }
        resolution
    }

    /// Submit, wait for the classification service, apply the outcome
    pub async fn analyze(&mut self) -> Option<Resolution> {
        let pending = self.begin_analysis()?;
        let outcome = self.backend.analyze(&pending.request).await;
        Some(self.finish_analysis(pending.ticket, outcome))
    }

    pub fn results(&self) -> Option<&AnalysisResult> {
        self.session.results()
    }

    /// Results projected for display, when there are any
    pub fn view(&self) -> Option<ResultView> {
        self.session.results().map(|r| self.renderer.project(r))
    }

    pub fn toggle_category(&mut self, category: &str) -> bool {
        self.renderer.toggle(category)
    }

    pub fn expand_all(&mut self) {
        if let Some(result) = self.session.results() {
            self.renderer.expand_all(result);
        }
    }

    pub fn feedback_due(&self) -> Option<Duration> {
        self.feedback_due
    }

    /// Wait out the scheduled delay, then open the feedback gate
    pub async fn open_feedback_after_delay(&mut self) -> bool {
        let Some(delay) = self.feedback_due.take() else {
            return false;
        };
        tokio::time::sleep(delay).await;

        // The user may have moved on during the delay
        if self.session.results().is_none() {
            debug!("Results gone before the feedback prompt opened");
            return false;
        }
        self.feedback.open()
    }

    pub async fn submit_feedback(
        &mut self,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<FeedbackOutcome, ValidationError> {
        self.feedback
            .submit(self.backend.as_ref(), &mut self.context, rating, comment)
            .await
    }

    pub fn dismiss_feedback(&mut self) -> bool {
        self.feedback.dismiss()
    }

    /// "New analysis"
    pub fn reset(&mut self) {
        self.session.reset();
        self.renderer = ResultRenderer::new();
        self.feedback_due = None;
    }
}
