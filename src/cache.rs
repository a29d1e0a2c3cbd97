use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::warn;

use crate::session::Role;

fn role_key(email: &str) -> String {
    format!("user_role_{email}")
}

fn name_key(email: &str) -> String {
    format!("user_role_{email}_name")
}

/// Local persistent key-value cache of last-known role and display name per
/// email. Used only for instant optimistic rendering before remote
/// confirmation; the remote `user_roles` table stays authoritative.
pub trait RoleCache: Send + Sync {
    fn get_role(&self, email: &str) -> Option<Role>;
    fn get_name(&self, email: &str) -> Option<String>;
    fn put(&self, email: &str, role: Role, name: Option<&str>);
}

/// JSON-file-backed cache, the browser localStorage analogue. Writes are
/// best-effort: a failed flush is logged and the in-memory view kept.
pub struct FileRoleCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileRoleCache {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("parse cache file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e).with_context(|| format!("read cache file {}", path.display())),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, String>) {
        let write = serde_json::to_string_pretty(entries)
            .map_err(anyhow::Error::from)
            .and_then(|raw| std::fs::write(&self.path, raw).map_err(anyhow::Error::from));
        if let Err(e) = write {
            warn!(error = %e, path = %self.path.display(), "failed to flush role cache");
        }
    }
}

impl RoleCache for FileRoleCache {
    fn get_role(&self, email: &str) -> Option<Role> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(&role_key(email)).map(|raw| Role::parse(raw))
    }

    fn get_name(&self, email: &str) -> Option<String> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(&name_key(email)).cloned()
    }

    fn put(&self, email: &str, role: Role, name: Option<&str>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(role_key(email), role.as_str().to_string());
        if let Some(name) = name {
            entries.insert(name_key(email), name.to_string());
        }
        self.flush(&entries);
    }
}

/// In-memory cache for tests and cache-less deployments.
#[derive(Default)]
pub struct MemoryRoleCache {
    entries: Mutex<HashMap<String, String>>,
}

impl RoleCache for MemoryRoleCache {
    fn get_role(&self, email: &str) -> Option<Role> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(&role_key(email)).map(|raw| Role::parse(raw))
    }

    fn get_name(&self, email: &str) -> Option<String> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(&name_key(email)).cloned()
    }

    fn put(&self, email: &str, role: Role, name: Option<&str>) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(role_key(email), role.as_str().to_string());
        if let Some(name) = name {
            entries.insert(name_key(email), name.to_string());
        }
    }
}
