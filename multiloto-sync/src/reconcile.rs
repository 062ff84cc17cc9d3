use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use multiloto_core::models::DrawRow;
use multiloto_core::parse::{parse_fixed_schema, parse_flexible_schema};
use multiloto_core::registry::{Game, ShapeConfig};
use multiloto_store::models::CacheEnvelope;
use multiloto_store::store::CacheStore;

use crate::source::RowSource;

/// Réglages du réconciliateur de fraîcheur.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Durée de vie d'une enveloppe avant sonde, en secondes.
    pub ttl_secs: i64,
    /// Volume minimal de lignes exploitables d'un fichier complet. En
    /// dessous, le fichier est considéré comme inutilisable (entête inconnue
    /// comprise : zéro ligne).
    pub min_rows: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 6 * 3600,
            min_rows: 10,
        }
    }
}

/// Signal d'abandon coopératif. Vérifié avant toute écriture de cache et
/// toute émission de résultat : un travail en vol peut se terminer, son
/// résultat est jeté.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Filtre de dates fourni par l'appelant, appliqué après le filtre d'ère.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFilter {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since.map_or(true, |s| date >= s) && self.until.map_or(true, |u| date <= u)
    }
}

fn apply_filter(rows: &[DrawRow], filter: &DateFilter) -> Vec<DrawRow> {
    rows.iter()
        .filter(|r| filter.contains(r.date))
        .cloned()
        .collect()
}

/// Schéma canonique d'abord ; repli sur le schéma flexible validé par la
/// forme du jeu. Zéro ligne = fichier méconnaissable, jamais une exception.
fn parse_any(text: &str, shape: &ShapeConfig) -> Vec<DrawRow> {
    let rows = parse_fixed_schema(text, shape);
    if !rows.is_empty() {
        return rows;
    }
    parse_flexible_schema(text)
        .into_iter()
        .filter(|r| r.is_valid_for(shape))
        .collect()
}

/// Machine à états de fraîcheur par groupe de jeu :
/// Vide → Frais → Périmé → Retéléchargement → Frais(nouveau).
pub struct Reconciler {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn RowSource>,
    /// Source de secours pour un sous-ensemble de jeux, hors navigateur.
    /// Chemin de rattrapage d'erreur uniquement, jamais le flux normal.
    fallback: Option<Arc<dyn RowSource>>,
    config: SyncConfig,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn RowSource>, config: SyncConfig) -> Self {
        Self {
            store,
            source,
            fallback: None,
            config,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn RowSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Retourne les lignes d'ère du jeu, filtrées par l'appelant, en
    /// réutilisant le cache chaque fois que la source distante n'a pas bougé.
    pub async fn fetch_rows(
        &self,
        game: Game,
        filter: &DateFilter,
        cancel: &CancelToken,
    ) -> Result<Vec<DrawRow>> {
        let shape = game.shape();
        let group = game.group().key();
        let now = Utc::now().timestamp();

        let cached = self.store.get(group)?.filter(|env| {
            let ok = env.matches_era(shape.era_start);
            if !ok {
                debug!(group, "ère changée : enveloppe traitée comme absente");
            }
            ok
        });

        if let Some(env) = &cached {
            if env.is_within_ttl(now) {
                debug!(group, "cache frais : aucun appel réseau");
                return Ok(apply_filter(&env.rows, filter));
            }
            // TTL écoulé : sonde légère avant de retélécharger le gros fichier
            match self.probe_latest(group, &shape).await {
                Ok(Some(sig)) if env.latest_signature().as_deref() == Some(sig.as_str()) => {
                    info!(group, "dernière ligne identique : cache conservé, TTL ré-armé");
                    let mut refreshed = env.clone();
                    refreshed.cached_at = now;
                    refreshed.next_refresh = now + self.config.ttl_secs;
                    if cancel.is_cancelled() {
                        bail!("Opération annulée");
                    }
                    self.store.put(&refreshed)?;
                    return Ok(apply_filter(&env.rows, filter));
                }
                Ok(_) => debug!(group, "dernière ligne différente : retéléchargement"),
                Err(e) => debug!(group, "sonde en échec ({e:#}) : retéléchargement"),
            }
        }

        // Retéléchargement complet
        let text = match self.fetch_full_with_fallback(group).await {
            Ok(text) => text,
            Err(e) => {
                if let Some(env) = &cached {
                    // Rafraîchissement non obligatoire : on dégrade vers le
                    // cache périmé plutôt que d'échouer.
                    warn!(group, "téléchargement en échec ({e:#}) : cache périmé servi");
                    return Ok(apply_filter(&env.rows, filter));
                }
                return Err(e.context(format!("Données indisponibles pour '{}'", group)));
            }
        };

        if cancel.is_cancelled() {
            bail!("Opération annulée");
        }

        let rows = parse_any(&text, &shape);
        if rows.len() < self.config.min_rows {
            bail!(
                "Données insuffisantes pour '{}' : {} ligne(s) exploitable(s)",
                group,
                rows.len()
            );
        }

        let era_rows: Vec<DrawRow> = rows
            .into_iter()
            .filter(|r| r.date >= shape.era_start)
            .collect();

        let envelope = CacheEnvelope {
            group: group.to_string(),
            era_start: shape.era_start,
            cached_at: now,
            next_refresh: now + self.config.ttl_secs,
            rows: era_rows.clone(),
        };
        if cancel.is_cancelled() {
            bail!("Opération annulée");
        }
        self.store.put(&envelope)?;
        info!(group, lignes = era_rows.len(), "enveloppe remplacée");

        Ok(apply_filter(&era_rows, filter))
    }

    async fn fetch_full_with_fallback(&self, group: &str) -> Result<String> {
        match self.source.fetch_full(group).await {
            Ok(text) => Ok(text),
            Err(primary) => match &self.fallback {
                Some(fb) => {
                    warn!(group, "source primaire en échec ({primary:#}) : source de secours");
                    fb.fetch_full(group).await
                }
                None => Err(primary),
            },
        }
    }

    /// Lit la signature de la dernière ligne distante. `Ok(None)` = fichier
    /// sonde illisible, traité comme une différence (retéléchargement).
    async fn probe_latest(&self, group: &str, shape: &ShapeConfig) -> Result<Option<String>> {
        let text = self.source.fetch_latest(group).await?;
        Ok(parse_any(&text, shape).last().map(|r| r.signature()))
    }
}
