use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::registry::{DrawStyle, ShapeConfig};

/// Ligne de tirage générique : k valeurs tirées dans un domaine, plus un
/// numéro spécial optionnel (Powerball, Cash Ball, ...). Les jeux à chiffres
/// (Numbers, Win 4) stockent des chiffres 0-9, avec répétitions possibles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRow {
    pub date: NaiveDate,
    pub values: Vec<u8>,
    pub special: Option<u8>,
}

impl DrawRow {
    /// Signature textuelle canonique, comparée lors de la sonde de fraîcheur.
    pub fn signature(&self) -> String {
        let values = self
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        match self.special {
            Some(s) => format!("{}|{}|{}", self.date, values, s),
            None => format!("{}|{}", self.date, values),
        }
    }

    /// Une ligne est exploitable pour une forme donnée si l'arité et les
    /// bornes collent. Les lignes invalides sont ignorées, jamais fatales.
    pub fn is_valid_for(&self, shape: &ShapeConfig) -> bool {
        if self.values.len() != shape.main_pick {
            return false;
        }
        if !self.values.iter().all(|&v| shape.value_in_range(v)) {
            return false;
        }
        match (shape.special_domain, self.special) {
            (0, _) => true,
            (d, Some(s)) => s >= 1 && s <= d,
            (_, None) => false,
        }
    }
}

/// Grille jouable : numéros principaux triés + numéro spécial éventuel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub mains: Vec<u8>,
    pub special: Option<u8>,
}

/// Classement d'un numéro par rapport à son espérance binomiale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberTag {
    Hot,
    Cold,
    Normal,
}

impl std::fmt::Display for NumberTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberTag::Hot => write!(f, "CHAUD"),
            NumberTag::Cold => write!(f, "FROID"),
            NumberTag::Normal => write!(f, "-"),
        }
    }
}

/// Étiquettes descriptives posées sur une grille déjà choisie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketHint {
    HotHeavy,
    ColdHeavy,
    ConsecutiveRun,
    LowNumberBias,
    ArithmeticProgression,
    TightCluster,
    Balanced,
}

impl std::fmt::Display for TicketHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketHint::HotHeavy => write!(f, "plutôt chaude"),
            TicketHint::ColdHeavy => write!(f, "plutôt froide"),
            TicketHint::ConsecutiveRun => write!(f, "suite consécutive"),
            TicketHint::LowNumberBias => write!(f, "biais dates (≤31)"),
            TicketHint::ArithmeticProgression => write!(f, "progression arithmétique"),
            TicketHint::TightCluster => write!(f, "numéros regroupés"),
            TicketHint::Balanced => write!(f, "équilibrée"),
        }
    }
}

/// Valide une grille saisie à la main contre la forme du jeu.
pub fn validate_ticket(ticket: &Ticket, shape: &ShapeConfig) -> Result<()> {
    if ticket.mains.len() != shape.main_pick {
        bail!(
            "Nombre de numéros invalide : {} attendus, {} fournis",
            shape.main_pick,
            ticket.mains.len()
        );
    }
    for &v in &ticket.mains {
        if !shape.value_in_range(v) {
            bail!("Numéro {} hors limites ({})", v, shape.domain_label());
        }
    }
    if shape.style == DrawStyle::Set {
        for i in 0..ticket.mains.len() {
            for j in (i + 1)..ticket.mains.len() {
                if ticket.mains[i] == ticket.mains[j] {
                    bail!("Numéro en double : {}", ticket.mains[i]);
                }
            }
        }
    }
    match (shape.special_domain, ticket.special) {
        (0, Some(s)) => bail!("Ce jeu n'a pas de numéro spécial (reçu {})", s),
        (0, None) => {}
        (d, Some(s)) if s < 1 || s > d => {
            bail!("Numéro spécial {} hors limites (1-{})", s, d)
        }
        (_, Some(_)) => {}
        (_, None) => bail!("Numéro spécial manquant"),
    }
    Ok(())
}
