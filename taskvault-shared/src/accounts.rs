//! Account lifecycle
//!
//! Registration, login, logout, token refresh, profile and password changes
//! and account deletion.
//!
//! # Sessions
//!
//! Each user has a single refresh token slot. Login, refresh and profile
//! updates mint a new token pair and overwrite the slot with the digest of
//! the new refresh token, which immediately invalidates the previous one.
//! Logout clears the slot. A refresh succeeds only while the presented token
//! is the one in the slot, so a consumed or superseded token is rejected even
//! though it is still validly signed and unexpired.
//!
//! Concurrent refreshes with the same token race on the slot: whichever
//! write lands last wins, and the other caller's new refresh token fails its
//! next use.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::auth::jwt::{TokenIssuer, TokenPair, TokenType};
use crate::auth::password::{hash_password_with, verify_password, HashParams};
use crate::auth::refresh_slot::{digest_token, slot_matches};
use crate::error::{CoreError, CoreResult};
use crate::models::user::normalize_identifier;
use crate::models::{CreateUser, PublicUser, UpdateUser, User, UserId};
use crate::store::CredentialStore;

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login input; either identifier may be used
#[derive(Debug, Clone)]
pub struct Login {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Password change input
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// A freshly opened session
#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

/// Account operations over a [`CredentialStore`]
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn CredentialStore>,
    issuer: Arc<TokenIssuer>,
    hash_params: HashParams,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("hash_params", &self.hash_params)
            .finish_non_exhaustive()
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !blank(v))
}

impl AccountService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        issuer: Arc<TokenIssuer>,
        hash_params: HashParams,
    ) -> Self {
        Self {
            users,
            issuer,
            hash_params,
        }
    }

    /// Creates an account
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a field is missing
    /// - `Conflict` if the username or the email is already registered
    pub async fn register(&self, input: Registration) -> CoreResult<PublicUser> {
        if blank(&input.username) || blank(&input.email) || input.password.is_empty() {
            return Err(CoreError::InvalidInput("All fields are required!".to_string()));
        }

        let existing = self
            .users
            .find_by_username_or_email(Some(&input.username), Some(&input.email))
            .await?;
        if existing.is_some() {
            return Err(CoreError::Conflict(
                "This Email Or User Name Already Exists!".to_string(),
            ));
        }

        let password_hash = self.hash(input.password).await?;

        let user = self
            .users
            .create(CreateUser {
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "New user registered");
        Ok(user.to_public())
    }

    /// Verifies credentials and opens a session
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if no identifier or no password is given
    /// - `NotFound` if no user matches the identifier
    /// - `InvalidCredentials` if the password does not verify
    pub async fn login(&self, input: Login) -> CoreResult<Session> {
        let username = non_blank(input.username);
        let email = non_blank(input.email);

        if username.is_none() && email.is_none() {
            return Err(CoreError::InvalidInput(
                "Username or Email Id is Required!".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(CoreError::InvalidInput("Password is Required!".to_string()));
        }

        let user = self
            .users
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| CoreError::NotFound("User doesn't exist!".to_string()))?;

        if !self.verify(input.password, user.password_hash.clone()).await? {
            return Err(CoreError::InvalidCredentials("Incorrect Password!".to_string()));
        }

        let tokens = self.open_session(user.id).await?;
        debug!(user_id = %user.id, "User logged in");

        Ok(Session {
            tokens,
            user: user.to_public(),
        })
    }

    /// Clears the refresh token slot
    pub async fn logout(&self, user_id: UserId) -> CoreResult<()> {
        if !self.users.set_refresh_token(user_id, None).await? {
            return Err(CoreError::Internal("Failed To Logout!".to_string()));
        }

        debug!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Exchanges the current refresh token for a new pair
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the token is absent, fails verification, names an
    /// unknown user, or is no longer the one in the user's slot.
    pub async fn refresh(&self, presented: Option<&str>) -> CoreResult<TokenPair> {
        let presented = presented
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| CoreError::Unauthorized("Unauthorized request".to_string()))?;

        let claims = self
            .issuer
            .verify(presented, TokenType::Refresh)
            .map_err(|e| {
                debug!(error = %e, "Refresh token rejected");
                CoreError::Unauthorized("Invalid refresh token".to_string())
            })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| CoreError::Unauthorized("Invalid refresh token".to_string()))?;

        if !slot_matches(user.refresh_token_hash.as_deref(), presented) {
            return Err(CoreError::Unauthorized(
                "Refresh token is expired or used".to_string(),
            ));
        }

        let tokens = self.open_session(user.id).await?;
        debug!(user_id = %user.id, "Access token refreshed");

        Ok(tokens)
    }

    /// Changes username and/or email and opens a new session
    ///
    /// The availability check matches against every user, the caller
    /// included, so resubmitting one's own current username or email is
    /// reported as a conflict.
    pub async fn update_account_info(
        &self,
        user_id: UserId,
        update: UpdateUser,
    ) -> CoreResult<Session> {
        let update = UpdateUser {
            username: non_blank(update.username).map(|v| normalize_identifier(&v)),
            email: non_blank(update.email).map(|v| normalize_identifier(&v)),
        };

        if update.is_empty() {
            return Err(CoreError::InvalidInput(
                "At Least One Field Is Required!".to_string(),
            ));
        }

        let taken = self
            .users
            .find_by_username_or_email(update.username.as_deref(), update.email.as_deref())
            .await?;
        if taken.is_some() {
            return Err(CoreError::Conflict(
                "The Username Or Email Is Already Taken!".to_string(),
            ));
        }

        let user = self
            .users
            .update_profile(user_id, update)
            .await?
            .ok_or_else(|| CoreError::Internal("Can't Find The User!".to_string()))?;

        let tokens = self.open_session(user.id).await?;

        Ok(Session {
            tokens,
            user: user.to_public(),
        })
    }

    /// Replaces the password after checking the old one
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a field is missing, confirmation differs, or the
    ///   new password equals the old one
    /// - `InvalidCredentials` if the old password does not verify
    pub async fn update_password(&self, user_id: UserId, change: PasswordChange) -> CoreResult<()> {
        if change.old_password.is_empty()
            || change.new_password.is_empty()
            || change.confirm_password.is_empty()
        {
            return Err(CoreError::InvalidInput(
                "Please Provide All The Passwords!".to_string(),
            ));
        }

        if change.new_password != change.confirm_password {
            return Err(CoreError::InvalidInput(
                "New Password And Confirm Password Didn't Match!".to_string(),
            ));
        }

        let user = self.load(user_id, "Can't Find The User!").await?;

        if !self
            .verify(change.old_password, user.password_hash.clone())
            .await?
        {
            return Err(CoreError::InvalidCredentials(
                "Old Password Didn't Match!".to_string(),
            ));
        }

        if self
            .verify(change.new_password.clone(), user.password_hash.clone())
            .await?
        {
            return Err(CoreError::InvalidInput(
                "Old And New Password Can't Be The Same!".to_string(),
            ));
        }

        let password_hash = self.hash(change.new_password).await?;
        if !self.users.set_password_hash(user_id, password_hash).await? {
            return Err(CoreError::Internal(
                "Something Went Wrong While Updating Password!".to_string(),
            ));
        }

        debug!(user_id = %user_id, "Password updated");
        Ok(())
    }

    /// Deletes the account; owned tasks are left in place
    pub async fn delete_account(&self, user_id: UserId) -> CoreResult<()> {
        self.load(user_id, "Cannot Find The Account!").await?;

        if !self.users.delete(user_id).await? {
            return Err(CoreError::Internal(
                "Failed To Delete User Account!".to_string(),
            ));
        }

        info!(user_id = %user_id, "User deleted their account");
        Ok(())
    }

    async fn load(&self, user_id: UserId, missing: &str) -> CoreResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(missing.to_string()))
    }

    /// Mints a pair and stores the refresh token digest in the slot
    async fn open_session(&self, user_id: UserId) -> CoreResult<TokenPair> {
        let tokens = self.issuer.issue_pair(user_id).map_err(|e| {
            error!(error = %e, "Token signing failed");
            CoreError::Internal("Something Went Wrong While Generating Tokens!".to_string())
        })?;

        let stored = self
            .users
            .set_refresh_token(user_id, Some(digest_token(&tokens.refresh_token)))
            .await?;
        if !stored {
            return Err(CoreError::Internal(
                "Something Went Wrong While Generating Tokens!".to_string(),
            ));
        }

        Ok(tokens)
    }

    /// Hashes on the blocking pool
    async fn hash(&self, password: String) -> CoreResult<String> {
        let params = self.hash_params;
        let hash = tokio::task::spawn_blocking(move || hash_password_with(&password, &params))
            .await
            .map_err(|e| CoreError::Internal(format!("Password hashing task failed: {}", e)))??;
        Ok(hash)
    }

    /// Verifies on the blocking pool
    async fn verify(&self, password: String, hash: String) -> CoreResult<bool> {
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| CoreError::Internal(format!("Password verification task failed: {}", e)))??;
        Ok(matches)
    }
}
