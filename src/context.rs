// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Session context: credential and per-user flags that outlive one analysis
//!
//! Loaded once at startup, passed explicitly to whatever needs it. Only the
//! auth module writes the credential; the analysis session and the feedback
//! gate read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::model::UserProfile;
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signed_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    has_reviewed: bool,

    /// Feedback was already offered during this process
    #[serde(skip)]
    feedback_offered: bool,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl SessionContext {
    /// A context that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the context file, starting fresh when it is missing or unreadable
    pub fn load(path: &Path) -> Result<Self> {
        let mut context = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<Self>(&content) {
                Ok(context) => context,
                Err(e) => {
                    warn!("Ignoring corrupt session file {:?}: {}", path, e);
                    Self::default()
                }
            }
        } else {
            debug!("No session file at {:?}", path);
            Self::default()
        };

        context.path = Some(path.to_path_buf());
        Ok(context)
    }

    /// Persist the context; a no-op for in-memory contexts
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;

        // The file holds a bearer token: owner-only from creation on
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // `mode` only applies to new files; tighten one left by an older version
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.logged_in && self.token.is_some()
    }

    /// Bearer credential, if signed in
    pub fn bearer(&self) -> Option<&str> {
        if self.logged_in {
            self.token.as_deref()
        } else {
            None
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.signed_in_at
    }

    pub fn has_reviewed(&self) -> bool {
        self.has_reviewed
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn mark_reviewed(&mut self) {
        self.has_reviewed = true;
    }

    /// Claim the one feedback offer of this process.
    ///
    /// True only for the first call, and only while the user has not reviewed.
    pub(crate) fn claim_feedback_offer(&mut self) -> bool {
        if self.has_reviewed || self.feedback_offered {
            return false;
        }
        self.feedback_offered = true;
        true
    }

    pub(crate) fn sign_in(&mut self, token: String, user: UserProfile) {
        self.logged_in = true;
        self.token = Some(token);
        self.user = Some(user);
        self.signed_in_at = Some(Utc::now());
    }

    /// Forget the credential and every per-user flag
    pub(crate) fn sign_out(&mut self) {
        let path = self.path.take();
        *self = Self { path, ..Self::default() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn alice() -> UserProfile {
        UserProfile { name: "Alice".into(), email: "alice@example.com".into() }
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/session.json");

        let mut context = SessionContext::load(&path).unwrap();
        assert!(!context.is_authenticated());
        context.sign_in("tok-1".into(), alice());
        context.mark_reviewed();
        context.save().unwrap();

        let reloaded = SessionContext::load(&path).unwrap();
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.bearer(), Some("tok-1"));
        assert_eq!(reloaded.user(), Some(&alice()));
        assert!(reloaded.has_reviewed());
        assert!(reloaded.signed_in_at().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let mut context = SessionContext::load(&path).unwrap();
        context.sign_in("tok-1".into(), alice());
        context.save().unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // A pre-existing world-readable file is tightened too
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        context.save().unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let context = SessionContext::load(&path).unwrap();
        assert!(!context.is_authenticated());
        assert_eq!(context.path(), Some(path.as_path()));
    }

    #[test]
    fn test_sign_out_clears_flags_but_keeps_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let mut context = SessionContext::load(&path).unwrap();
        context.sign_in("tok".into(), alice());
        context.mark_reviewed();

        context.sign_out();
        assert!(context.bearer().is_none());
        assert!(context.user().is_none());
        assert!(!context.has_reviewed());
        assert_eq!(context.path(), Some(path.as_path()));
    }

    #[test]
    fn test_feedback_offer_claimed_once() {
        let mut context = SessionContext::in_memory();
        assert!(context.claim_feedback_offer());
        assert!(!context.claim_feedback_offer());

        let mut reviewed = SessionContext::in_memory();
        reviewed.mark_reviewed();
        assert!(!reviewed.claim_feedback_offer());
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        SessionContext::in_memory().save().unwrap();
    }
}
