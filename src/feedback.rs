// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Feedback gate: the rating prompt offered after a successful analysis

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::ReviewBackend;
use crate::config::FeedbackConfig;
use crate::context::SessionContext;
use crate::error::{CollaboratorError, ValidationError};
use crate::model::ReviewRequest;

/// Message shown when the review endpoint fails without saying why
pub const REVIEW_FALLBACK: &str = "Failed to submit review";

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackState {
    Closed,
    Open,
    Submitting { rating: u8, comment: Option<String> },
    Submitted,
    Error(String),
}

/// How an async submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    /// Accepted; the gate has closed for good
    Submitted,
    /// Rejected; the gate is open again for a retry or dismissal
    Failed(String),
    /// The gate was not accepting a submission
    Ignored,
}

#[derive(Debug)]
pub struct FeedbackGate {
    state: FeedbackState,
    success_display: Duration,
    error_display: Duration,
}

impl Default for FeedbackGate {
    fn default() -> Self {
        Self::from_config(&FeedbackConfig::default())
    }
}

impl FeedbackGate {
    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self::with_timing(config.success_display(), config.error_display())
    }

    pub fn with_timing(success_display: Duration, error_display: Duration) -> Self {
        Self {
            state: FeedbackState::Closed,
            success_display,
            error_display,
        }
    }

    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state != FeedbackState::Closed
    }

    /// Show the prompt. Only a closed gate opens.
    pub fn open(&mut self) -> bool {
        if self.state != FeedbackState::Closed {
            return false;
        }
        debug!("Opening feedback prompt");
        self.state = FeedbackState::Open;
        true
    }

    /// Validate and enter `Submitting`, returning the request to send.
    ///
    /// Rating problems fail before anything else. `Ok(None)` means the gate
    /// is not showing a form (closed, already submitting or submitted).
    pub fn begin_submit(
        &mut self,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<Option<ReviewRequest>, ValidationError> {
        match rating {
            0 => return Err(ValidationError::MissingRating),
            1..=5 => {}
            other => return Err(ValidationError::RatingOutOfRange(other)),
        }

        if !matches!(self.state, FeedbackState::Open | FeedbackState::Error(_)) {
            return Ok(None);
        }

        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);

        self.state = FeedbackState::Submitting {
            rating,
            comment: comment.clone(),
        };
        Ok(Some(ReviewRequest { rating, comment }))
    }

    /// Record the outcome of the request started by `begin_submit`.
    ///
    /// Success marks the context as reviewed so the gate is never offered
    /// again for this user.
    pub fn finish_submit(
        &mut self,
        outcome: Result<(), CollaboratorError>,
        context: &mut SessionContext,
    ) -> bool {
        if !matches!(self.state, FeedbackState::Submitting { .. }) {
            return false;
        }

        match outcome {
            Ok(()) => {
                info!("Review submitted");
                context.mark_reviewed();
                self.state = FeedbackState::Submitted;
            }
            Err(e) => {
                let message = e.message(REVIEW_FALLBACK);
                warn!("Review submission failed: {}", message);
                self.state = FeedbackState::Error(message);
            }
        }
        true
    }

    /// End of the display delay: `Submitted` closes, `Error` reopens the form
    pub fn settle(&mut self) {
        match self.state {
            FeedbackState::Submitted => {
                self.dismiss();
            }
            FeedbackState::Error(_) => self.state = FeedbackState::Open,
            _ => {}
        }
    }

    /// Hide the prompt. Refused while a submission is in flight.
    pub fn dismiss(&mut self) -> bool {
        if matches!(self.state, FeedbackState::Submitting { .. }) {
            return false;
        }
        self.state = FeedbackState::Closed;
        true
    }

    /// Full submission: validate, post, show the outcome for its display
    /// delay, then settle.
    pub async fn submit<B>(
        &mut self,
        backend: &B,
        context: &mut SessionContext,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<FeedbackOutcome, ValidationError>
    where
        B: ReviewBackend + ?Sized,
    {
        let Some(request) = self.begin_submit(rating, comment)? else {
            return Ok(FeedbackOutcome::Ignored);
        };

        let outcome = backend.submit_review(context.bearer(), &request).await;
        self.finish_submit(outcome, context);

        let result = match &self.state {
            FeedbackState::Submitted => {
                tokio::time::sleep(self.success_display).await;
                FeedbackOutcome::Submitted
            }
            FeedbackState::Error(message) => {
                let message = message.clone();
                tokio::time::sleep(self.error_display).await;
                FeedbackOutcome::Failed(message)
            }
            _ => FeedbackOutcome::Ignored,
        };
        self.settle();
        Ok(result)
    }
}
