//! Identity service: registration, login and token authentication.

use std::collections::HashSet;

use domain::Principal;
use store::{NewUser, Store, StoreError, User};

use crate::email::Email;
use crate::error::AuthError;
use crate::password::{hash_password, validate_password, verify_password};
use crate::token::{IssuedToken, TokenIssuer};

/// Service for managing accounts and sessions.
pub struct IdentityService<S: Store> {
    store: S,
    tokens: TokenIssuer,
    admin_emails: HashSet<String>,
}

impl<S: Store> IdentityService<S> {
    /// Creates a new identity service.
    ///
    /// Accounts registered with an email in `admin_emails` get the admin
    /// capability.
    pub fn new(
        store: S,
        tokens: TokenIssuer,
        admin_emails: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            store,
            tokens,
            admin_emails: admin_emails.into_iter().collect(),
        }
    }

    /// Registers a new account.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let is_admin = self.admin_emails.contains(email.as_str());

        let user = self
            .store
            .insert_user(NewUser {
                email: email.into_inner(),
                password_hash,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateEmail(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, is_admin, "User registered");
        Ok(user)
    }

    /// Checks credentials and issues a session token.
    ///
    /// Unknown emails and wrong passwords fail the same way.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let result = self.check_credentials(email, password).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!("logins_total", "outcome" => outcome).increment(1);

        let user = result?;
        self.tokens.issue(user.id, user.is_admin)
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .store
            .find_user_by_email(email.as_str())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;
        Ok(user)
    }

    /// Verifies a session token, producing the request's [`Principal`].
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens.verify(token)
    }
}
