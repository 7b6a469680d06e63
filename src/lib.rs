// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! NewsClassify: AI-powered news categorization client
//!
//! Uploads documents, video and audio to a classification service, drives the
//! analysis session, renders categorized results and collects user feedback.

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod intake;
pub mod language;
pub mod model;
pub mod render;
pub mod session;

pub use config::AppConfig;
pub use error::{NewsClassifyError, Result};
