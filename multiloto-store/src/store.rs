use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use crate::models::CacheEnvelope;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    group_key     TEXT PRIMARY KEY,
    era_start     TEXT NOT NULL,
    cached_at     INTEGER NOT NULL,
    next_refresh  INTEGER NOT NULL,
    rows_json     TEXT NOT NULL
);
";

/// Abstraction clé-valeur du cache persistant. Les enveloppes sont lues puis
/// remplacées en bloc, jamais rapiécées : deux écrivains concurrents sur le
/// même groupe donnent simplement « dernier écrit gagne ».
pub trait CacheStore: Send + Sync {
    fn get(&self, group: &str) -> Result<Option<CacheEnvelope>>;
    fn put(&self, envelope: &CacheEnvelope) -> Result<()>;
    fn remove(&self, group: &str) -> Result<()>;
}

pub fn db_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("multiloto.db");
    path
}

/// Implémentation SQLite, une ligne par groupe de jeu, lignes de tirage en
/// JSON (l'arité varie d'un jeu à l'autre, pas de colonnes fixes possibles).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Impossible d'ouvrir le cache {:?}", path))?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Impossible d'ouvrir le cache mémoire")?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("Échec de la migration")?;
    Ok(())
}

impl CacheStore for SqliteStore {
    fn get(&self, group: &str) -> Result<Option<CacheEnvelope>> {
        let conn = self.conn.lock().expect("verrou du cache empoisonné");
        let mut stmt = conn.prepare(
            "SELECT era_start, cached_at, next_refresh, rows_json
             FROM cache_entries WHERE group_key = ?1",
        )?;
        let found = stmt
            .query_row([group], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        let Some((era, cached_at, next_refresh, json)) = found else {
            return Ok(None);
        };
        let era_start = NaiveDate::parse_from_str(&era, "%Y-%m-%d")
            .with_context(|| format!("Ère illisible en cache pour '{}': '{}'", group, era))?;
        let rows = serde_json::from_str(&json)
            .with_context(|| format!("Lignes illisibles en cache pour '{}'", group))?;
        Ok(Some(CacheEnvelope {
            group: group.to_string(),
            era_start,
            cached_at,
            next_refresh,
            rows,
        }))
    }

    fn put(&self, envelope: &CacheEnvelope) -> Result<()> {
        let json = serde_json::to_string(&envelope.rows).context("Sérialisation des lignes")?;
        let conn = self.conn.lock().expect("verrou du cache empoisonné");
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries
             (group_key, era_start, cached_at, next_refresh, rows_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                envelope.group,
                envelope.era_start.format("%Y-%m-%d").to_string(),
                envelope.cached_at,
                envelope.next_refresh,
                json,
            ],
        )
        .context("Échec de l'écriture du cache")?;
        Ok(())
    }

    fn remove(&self, group: &str) -> Result<()> {
        let conn = self.conn.lock().expect("verrou du cache empoisonné");
        conn.execute("DELETE FROM cache_entries WHERE group_key = ?1", [group])?;
        Ok(())
    }
}

/// Implémentation en mémoire, pour les tests et les exécutions jetables.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEnvelope>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, group: &str) -> Result<Option<CacheEnvelope>> {
        let entries = self.entries.lock().expect("verrou du cache empoisonné");
        Ok(entries.get(group).cloned())
    }

    fn put(&self, envelope: &CacheEnvelope) -> Result<()> {
        let mut entries = self.entries.lock().expect("verrou du cache empoisonné");
        entries.insert(envelope.group.clone(), envelope.clone());
        Ok(())
    }

    fn remove(&self, group: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("verrou du cache empoisonné");
        entries.remove(group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiloto_core::models::DrawRow;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn envelope(group: &str, rows: Vec<DrawRow>) -> CacheEnvelope {
        CacheEnvelope {
            group: group.to_string(),
            era_start: date("2015-10-07"),
            cached_at: 1_700_000_000,
            next_refresh: 1_700_021_600,
            rows,
        }
    }

    fn sample_rows() -> Vec<DrawRow> {
        vec![
            DrawRow {
                date: date("2024-01-01"),
                values: vec![5, 12, 23, 34, 45],
                special: Some(7),
            },
            DrawRow {
                date: date("2024-01-03"),
                values: vec![1, 2, 30, 40, 69],
                special: Some(26),
            },
        ]
    }

    fn exercise_round_trip(store: &dyn CacheStore) {
        assert!(store.get("powerball").unwrap().is_none());

        let env = envelope("powerball", sample_rows());
        store.put(&env).unwrap();
        let read = store.get("powerball").unwrap().unwrap();
        assert_eq!(read, env);

        // Remplacement en bloc : la deuxième écriture écrase tout
        let mut newer = envelope("powerball", vec![sample_rows()[0].clone()]);
        newer.cached_at += 100;
        store.put(&newer).unwrap();
        let read = store.get("powerball").unwrap().unwrap();
        assert_eq!(read.rows.len(), 1);
        assert_eq!(read.cached_at, newer.cached_at);

        store.remove("powerball").unwrap();
        assert!(store.get("powerball").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        exercise_round_trip(&store);
    }

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryStore::new();
        exercise_round_trip(&store);
    }

    #[test]
    fn test_disjoint_groups_do_not_collide() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&envelope("powerball", sample_rows())).unwrap();
        store.put(&envelope("take5", Vec::new())).unwrap();

        assert_eq!(store.get("powerball").unwrap().unwrap().rows.len(), 2);
        assert!(store.get("take5").unwrap().unwrap().rows.is_empty());
    }

    #[test]
    fn test_rows_survive_json_round_trip_exactly() {
        let store = SqliteStore::open_in_memory().unwrap();
        let env = envelope("megamillions", sample_rows());
        store.put(&env).unwrap();
        let read = store.get("megamillions").unwrap().unwrap();
        assert_eq!(read.rows, env.rows, "dates, valeurs et spécial conservés");
    }
}
