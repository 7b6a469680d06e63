// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Login, signup and logout
//!
//! The only writer of the credential held in [`SessionContext`].

use tracing::info;

use crate::client::ApiClient;
use crate::context::SessionContext;
use crate::error::ValidationError;
use crate::model::{AuthResponse, LoginRequest, SignupRequest, UserProfile};
use crate::{NewsClassifyError, Result};

pub const LOGIN_FALLBACK: &str = "Login failed";
pub const SIGNUP_FALLBACK: &str = "Signup failed";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Fair,
    Good,
    Strong,
}

impl PasswordStrength {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
        }
    }
}

/// Length-based strength hint; `None` for an empty password
pub fn password_strength(password: &str) -> Option<PasswordStrength> {
    match password.chars().count() {
        0 => None,
        1..=3 => Some(PasswordStrength::Weak),
        4..=5 => Some(PasswordStrength::Fair),
        6..=7 => Some(PasswordStrength::Good),
        _ => Some(PasswordStrength::Strong),
    }
}

/// Signup input as typed by the user
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Local checks, mismatch first, then length
    pub fn validate(self) -> std::result::Result<SignupRequest, ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(SignupRequest {
            name: self.name,
            email: self.email,
            password: self.password,
        })
    }
}

pub async fn login(
    client: &ApiClient,
    context: &mut SessionContext,
    email: &str,
    password: &str,
) -> Result<UserProfile> {
    let request = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let response = client
        .login(&request)
        .await
        .map_err(|e| NewsClassifyError::Auth(e.message(LOGIN_FALLBACK)))?;
    store(context, response)
}

pub async fn signup(
    client: &ApiClient,
    context: &mut SessionContext,
    form: SignupForm,
) -> Result<UserProfile> {
    let request = form.validate()?;
    let response = client
        .signup(&request)
        .await
        .map_err(|e| NewsClassifyError::Auth(e.message(SIGNUP_FALLBACK)))?;
    store(context, response)
}

/// Forget the credential and every per-user flag
pub fn logout(context: &mut SessionContext) -> Result<()> {
    context.sign_out();
    context.save()
}

fn store(context: &mut SessionContext, response: AuthResponse) -> Result<UserProfile> {
    info!("Signed in as {} <{}>", response.user.name, response.user.email);
    let user = response.user.clone();
    context.sign_in(response.access_token, response.user);
    context.save()?;
    Ok(user)
}
