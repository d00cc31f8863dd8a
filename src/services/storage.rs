use crate::domain::constants::APP_DIR;
use crate::domain::models::State;
use std::path::{Path, PathBuf};

/// Snapshot persistence for the whole roster.
pub trait RosterStore {
    fn load(&self) -> anyhow::Result<State>;
    fn save(&self, state: &State) -> anyhow::Result<()>;
}

pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    fn audit_path(&self) -> PathBuf {
        self.dir.join("audit.jsonl")
    }

    /// Appends one event to the audit trail. Failures are logged, never fatal.
    pub fn audit(&self, actor: &str, action: &str, data: serde_json::Value) {
        let event = serde_json::json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "actor": actor,
            "action": action,
            "data": data
        });
        let line = format!("{}\n", event);
        let res = std::fs::create_dir_all(&self.dir).and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.audit_path())
                .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()))
        });
        if let Err(e) = res {
            log::warn!("audit write failed: {}", e);
        }
    }
}

impl RosterStore for FileStore {
    fn load(&self) -> anyhow::Result<State> {
        let p = self.state_path();
        if !p.exists() {
            return Ok(State::default());
        }
        let raw = std::fs::read_to_string(&p)?;
        serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("corrupt state file {}: {}", p.display(), e))
    }

    fn save(&self, s: &State) -> anyhow::Result<()> {
        write_atomic(&self.state_path(), &serde_json::to_string_pretty(s)?)
    }
}

/// Writes through a sibling temp file so readers never see a partial document.
pub fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Agent, Client};

    #[test]
    fn missing_state_loads_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("data"));
        let s = store.load().unwrap();
        assert!(s.clients.is_empty() && s.visits.is_empty());
    }

    #[test]
    fn save_then_load_keeps_collections() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let mut s = State::default();
        s.clients.push(Client::new("Acme", "Cluj", "", ""));
        s.agents.push(Agent {
            id: "a1".into(),
            name: "Ion".into(),
        });
        store.save(&s).unwrap();
        assert!(!tmp.path().join("state.tmp").exists());
        let back = store.load().unwrap();
        assert_eq!(back.clients, s.clients);
        assert_eq!(back.agents, s.agents);
    }

    #[test]
    fn legacy_client_without_cadence_gets_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        std::fs::write(
            store.state_path(),
            r#"{"clients":[{"id":"c1","name":"Old"}],"visits":[]}"#,
        )
        .unwrap();
        let s = store.load().unwrap();
        assert_eq!(s.clients[0].monthly_count, 2);
        assert_eq!(s.clients[0].monthly_weeks, vec![1, 3]);
        assert!(s.users.is_empty());
    }

    #[test]
    fn audit_appends_lines() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.audit("admin", "client.add", serde_json::json!({"name": "Acme"}));
        store.audit("admin", "client.remove", serde_json::json!({"id": "c1"}));
        let raw = std::fs::read_to_string(tmp.path().join("audit.jsonl")).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.contains("client.remove"));
    }
}
