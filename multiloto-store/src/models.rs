use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use multiloto_core::models::DrawRow;

/// Enveloppe de cache d'un groupe de jeu : lignes déjà parsées, ère active au
/// moment de la mise en cache, et deux horodatages (epoch secondes). Une
/// enveloppe n'est jamais retouchée partiellement : toujours remplacée en bloc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub group: String,
    pub era_start: NaiveDate,
    pub cached_at: i64,
    pub next_refresh: i64,
    pub rows: Vec<DrawRow>,
}

impl CacheEnvelope {
    /// Une enveloppe n'est digne de confiance que si son ère stockée est
    /// encore l'ère résolue du jeu ; tout écart l'invalide en bloc.
    pub fn matches_era(&self, era_start: NaiveDate) -> bool {
        self.era_start == era_start
    }

    pub fn is_within_ttl(&self, now: i64) -> bool {
        self.next_refresh > now
    }

    /// Signature de la ligne la plus récente, pour la sonde de fraîcheur.
    pub fn latest_signature(&self) -> Option<String> {
        self.rows.last().map(|r| r.signature())
    }
}
