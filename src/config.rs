use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Deadline for reconciling a sign-in against the remote role table.
    pub timeout_secs: u64,
    /// Emails force-promoted to admin regardless of the stored role.
    pub admin_overrides: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub sync: SyncConfig,
    /// Where the role/name cache file lives.
    pub cache_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let sync = SyncConfig {
            timeout_secs: std::env::var("MEALBOARD_SYNC_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
            admin_overrides: std::env::var("MEALBOARD_ADMIN_OVERRIDES")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };
        let cache_path = std::env::var("MEALBOARD_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("mealboard_cache.json"));
        Ok(Self {
            database_url,
            sync,
            cache_path,
        })
    }
}
