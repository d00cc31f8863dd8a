use crate::cli::Role;
use crate::domain::constants::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use crate::domain::models::{new_id, Session, SessionRecord, State, User};
use crate::error::PlanError;
use crate::services::storage::write_atomic;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

pub trait SessionProvider {
    fn current_session(&self, state: &State) -> anyhow::Result<Session>;
    fn sign_in(&self, state: &State, username: &str, password: &str) -> anyhow::Result<Session>;
    fn sign_out(&self) -> anyhow::Result<()>;
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// `salt$hex(sha256(salt:password))`
pub fn hash_password(password: &str) -> String {
    let salt = new_id();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

/// Adds the built-in administrator when missing. Returns whether state changed.
pub fn ensure_default_admin(state: &mut State) -> bool {
    if state
        .users
        .iter()
        .any(|u| u.username == DEFAULT_ADMIN_USERNAME)
    {
        return false;
    }
    state.users.push(User {
        id: new_id(),
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        pass_hash: hash_password(DEFAULT_ADMIN_PASSWORD),
        role: Role::Administrator,
        agent_id: None,
    });
    log::info!("created default administrator account");
    true
}

pub fn session_for_user(state: &State, user: &User) -> anyhow::Result<Session> {
    match user.role {
        Role::Administrator => Ok(Session::Administrator {
            user_id: user.id.clone(),
            username: user.username.clone(),
        }),
        Role::Agent => {
            let bound = user
                .agent_id
                .as_ref()
                .filter(|a| state.agents.iter().any(|x| &x.id == *a));
            match bound {
                Some(agent_id) => Ok(Session::FieldAgent {
                    user_id: user.id.clone(),
                    username: user.username.clone(),
                    agent_id: agent_id.clone(),
                }),
                None => Err(PlanError::PermissionDenied(format!(
                    "account {} is not bound to an agent",
                    user.username
                ))
                .into()),
            }
        }
    }
}

pub struct FileSessionProvider {
    path: PathBuf,
}

impl FileSessionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_record(&self) -> anyhow::Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&raw) {
            Ok(r) => Ok(Some(r)),
            Err(e) => {
                log::warn!("ignoring unreadable session file: {}", e);
                Ok(None)
            }
        }
    }
}

impl SessionProvider for FileSessionProvider {
    fn current_session(&self, state: &State) -> anyhow::Result<Session> {
        let record = self.read_record()?.ok_or(PlanError::NotLoggedIn)?;
        let user = state.user(&record.user_id).ok_or(PlanError::NotLoggedIn)?;
        session_for_user(state, user)
    }

    fn sign_in(&self, state: &State, username: &str, password: &str) -> anyhow::Result<Session> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(PlanError::Validation("username and password are required".into()).into());
        }
        let user = state
            .users
            .iter()
            .find(|u| u.username == username.trim())
            .filter(|u| verify_password(&u.pass_hash, password))
            .ok_or(PlanError::InvalidCredentials)?;
        let session = session_for_user(state, user)?;
        let record = SessionRecord {
            user_id: user.id.clone(),
        };
        write_atomic(&self.path, &serde_json::to_string_pretty(&record)?)?;
        Ok(session)
    }

    fn sign_out(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Agent;
    use crate::error::error_code;

    fn state_with_agent_user(bound: Option<&str>) -> State {
        let mut s = State::default();
        ensure_default_admin(&mut s);
        s.agents.push(Agent {
            id: "A1".into(),
            name: "Ion".into(),
        });
        s.users.push(User {
            id: "u1".into(),
            username: "ion".into(),
            pass_hash: hash_password("secret"),
            role: Role::Agent,
            agent_id: bound.map(str::to_string),
        });
        s
    }

    #[test]
    fn password_hash_verifies_and_is_salted() {
        let a = hash_password("admin123");
        let b = hash_password("admin123");
        assert_ne!(a, b);
        assert!(verify_password(&a, "admin123"));
        assert!(!verify_password(&a, "admin124"));
        assert!(!verify_password("garbage", "admin123"));
    }

    #[test]
    fn default_admin_is_added_once() {
        let mut s = State::default();
        assert!(ensure_default_admin(&mut s));
        assert!(!ensure_default_admin(&mut s));
        assert_eq!(s.users.len(), 1);
    }

    #[test]
    fn sign_in_persists_and_resolves_field_agent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let provider = FileSessionProvider::new(tmp.path().join("session.json"));
        let s = state_with_agent_user(Some("A1"));
        let session = provider.sign_in(&s, "ion", "secret").unwrap();
        assert_eq!(session.agent_id(), Some("A1"));
        assert_eq!(provider.current_session(&s).unwrap(), session);
        provider.sign_out().unwrap();
        let err = provider.current_session(&s).unwrap_err();
        assert_eq!(error_code(&err), "AUTH_REQUIRED");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let provider = FileSessionProvider::new(tmp.path().join("session.json"));
        let s = state_with_agent_user(Some("A1"));
        let err = provider.sign_in(&s, "ion", "nope").unwrap_err();
        assert_eq!(error_code(&err), "AUTH_FAILED");
    }

    #[test]
    fn unbound_field_agent_cannot_act() {
        let s = state_with_agent_user(None);
        let user = s.user("u1").unwrap();
        let err = session_for_user(&s, user).unwrap_err();
        assert_eq!(error_code(&err), "PERMISSION_DENIED");
    }
}
