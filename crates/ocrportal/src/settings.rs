//! The portal-wide settings singleton.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{format_timestamp, parse_timestamp, settings_repo, Database, DatabaseError};
use crate::engine::CapabilityRegistry;
use crate::job::EngineKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalSettings {
    pub engine: EngineKind,
    pub updated_at: DateTime<Utc>,
    /// False for the transient default returned before the table exists.
    pub persisted: bool,
}

/// Reads and updates the settings row, and answers availability questions
/// through the shared capability registry.
#[derive(Clone)]
pub struct SettingsResolver {
    db: Database,
    capabilities: Arc<CapabilityRegistry>,
    default_engine: EngineKind,
}

impl SettingsResolver {
    pub fn new(db: Database, capabilities: Arc<CapabilityRegistry>, default_engine: EngineKind) -> Self {
        Self {
            db,
            capabilities,
            default_engine,
        }
    }

    /// Returns the singleton, creating it with the default engine on first
    /// access. Before the settings table exists a transient default is
    /// returned and nothing is written.
    pub fn load(&self) -> Result<PortalSettings, DatabaseError> {
        let now = Utc::now();
        match settings_repo::get_or_create(&self.db, self.default_engine.as_str(), &format_timestamp(&now)) {
            Ok(row) => {
                let engine = EngineKind::parse(&row.engine).unwrap_or_else(|| {
                    tracing::warn!(
                        stored = %row.engine,
                        fallback = %self.default_engine,
                        "Unknown engine in settings, using default"
                    );
                    self.default_engine
                });
                Ok(PortalSettings {
                    engine,
                    updated_at: parse_timestamp(&row.updated_at),
                    persisted: true,
                })
            }
            Err(e) if e.is_missing_table() => {
                tracing::warn!("Settings table missing, using transient defaults");
                Ok(PortalSettings {
                    engine: self.default_engine,
                    updated_at: now,
                    persisted: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Administrative engine selection. Affects later dispatches only; jobs
    /// already running keep the engine recorded in their options.
    pub async fn set_engine(&self, engine: EngineKind) -> Result<PortalSettings, DatabaseError> {
        if engine == EngineKind::Docling && !self.conversion_available().await {
            // Allowed anyway: jobs will fail with a message naming the missing
            // dependency until it is installed.
            tracing::warn!("Docling selected but not available on this host");
        }

        settings_repo::set_engine(&self.db, engine.as_str(), &format_timestamp(&Utc::now()))?;
        tracing::info!(engine = %engine, "OCR engine changed");
        self.load()
    }

    pub async fn conversion_available(&self) -> bool {
        self.capabilities.conversion_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ProbeOutcome, StaticProbe};

    fn resolver(db: Database, outcome: ProbeOutcome) -> SettingsResolver {
        SettingsResolver::new(
            db,
            Arc::new(CapabilityRegistry::new(Arc::new(StaticProbe(outcome)))),
            EngineKind::Ocrmypdf,
        )
    }

    #[test]
    fn test_load_creates_default() {
        let db = Database::open_in_memory().unwrap();
        let settings = resolver(db.clone(), ProbeOutcome::Missing).load().unwrap();

        assert_eq!(settings.engine, EngineKind::Ocrmypdf);
        assert!(settings.persisted);
        assert!(settings_repo::find(&db).unwrap().is_some());
    }

    #[test]
    fn test_load_without_table_is_transient() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let db = Database::from_connection(conn);

        let settings = resolver(db, ProbeOutcome::Missing).load().unwrap();
        assert_eq!(settings.engine, EngineKind::Ocrmypdf);
        assert!(!settings.persisted);
    }

    #[test]
    fn test_unknown_stored_engine_falls_back() {
        let db = Database::open_in_memory().unwrap();
        settings_repo::set_engine(&db, "abbyy", "2026-01-01T00:00:00+00:00").unwrap();

        let settings = resolver(db, ProbeOutcome::Missing).load().unwrap();
        assert_eq!(settings.engine, EngineKind::Ocrmypdf);
    }

    #[tokio::test]
    async fn test_set_engine_persists_even_if_unavailable() {
        let db = Database::open_in_memory().unwrap();
        let resolver = resolver(db, ProbeOutcome::Missing);

        let updated = resolver.set_engine(EngineKind::Docling).await.unwrap();
        assert_eq!(updated.engine, EngineKind::Docling);
        assert_eq!(resolver.load().unwrap().engine, EngineKind::Docling);
        assert!(!resolver.conversion_available().await);
    }
}
