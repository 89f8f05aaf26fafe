//! Sign-in, sign-up and account maintenance.

use std::sync::Arc;

use bugboard_core::account::{LoginRequest, PasswordChange, RegisterRequest};
use bugboard_core::user::{Session, User};
use bugboard_events::{ClientEvent, EventBus};

use crate::api::BugBoardApi;
use crate::error::ApiResult;

/// Fields of the sign-up form.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

pub struct AccountView {
    api: Arc<BugBoardApi>,
    bus: Arc<EventBus>,
}

impl AccountView {
    pub fn new(api: Arc<BugBoardApi>, bus: Arc<EventBus>) -> Self {
        Self { api, bus }
    }

    pub fn current_user(&self) -> Option<User> {
        self.api.current_user()
    }

    /// Sign in and keep the session.
    ///
    /// A banned account is refused by the server with 403; the server's
    /// message is carried in the returned error.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        let request = LoginRequest::new(username, password)?;
        match self.api.login(&request).await {
            Ok(session) => {
                self.bus.publish(ClientEvent::SessionChanged {
                    user_id: Some(session.user.id.clone()),
                });
                Ok(session)
            }
            Err(err) => {
                tracing::warn!(username = %request.username, status = ?err.status(), "Login failed");
                Err(err)
            }
        }
    }

    /// Create an account with the `USER` role. Does not sign in.
    pub async fn register(&self, form: Registration) -> ApiResult<User> {
        let request = RegisterRequest::new(form.username, form.email, form.password, form.phone)?;
        let user = self.api.register(&request).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Account registered");
        Ok(user)
    }

    pub fn logout(&self) -> ApiResult<()> {
        self.api.logout()?;
        self.bus.publish(ClientEvent::SessionChanged { user_id: None });
        Ok(())
    }

    /// Change the signed-in user's password. `confirmation` must match.
    pub async fn change_password(&self, new_password: &str, confirmation: &str) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "change your password")?;
        let change = PasswordChange::new(new_password, confirmation)?;
        self.api.change_password(&user.id, &change).await?;
        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Delete the signed-in user's account and drop the session.
    pub async fn delete_account(&self) -> ApiResult<()> {
        let user = super::signed_in(&self.api, "delete your account")?;
        self.api.delete_account().await?;
        tracing::info!(user_id = %user.id, "Account deleted");
        self.bus.publish(ClientEvent::SessionChanged { user_id: None });
        Ok(())
    }
}
