//! Login with auto-registration

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::models::{NewUser, User, UserInfo};
use crate::service::password::{hash_password, verify_password};
use crate::store::ScoreStore;
use std::sync::Arc;
use tracing::{debug, info};

pub struct UserService {
    store: Arc<dyn ScoreStore>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(store: Arc<dyn ScoreStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Log in, creating the account on first use of a username
    pub fn login(&self, username: &str, password: &str) -> CoreResult<UserInfo> {
        if let Some(user) = self.store.find_user_by_username(username)? {
            return self.check_password(&user, password);
        }

        let new_user = NewUser {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            created_at: self.clock.now_millis(),
        };

        match self.store.insert_user(&new_user) {
            Ok(id) => {
                info!(user_id = id, username, "User registered");
                Ok(UserInfo {
                    id,
                    username: new_user.username,
                    created_at: new_user.created_at,
                    updated_at: new_user.created_at,
                })
            }
            // Lost a registration race: the other request's row wins
            Err(CoreError::DuplicateUser { .. }) => {
                let user = self.store.find_user_by_username(username)?.ok_or_else(|| {
                    CoreError::DuplicateUser {
                        username: username.to_string(),
                    }
                })?;
                self.check_password(&user, password)
            }
            Err(e) => Err(e),
        }
    }

    fn check_password(&self, user: &User, password: &str) -> CoreResult<UserInfo> {
        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = user.id, "Password mismatch");
            return Err(CoreError::InvalidCredentials);
        }
        Ok(UserInfo::from(user))
    }
}
