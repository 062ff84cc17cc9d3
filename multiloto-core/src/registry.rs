use anyhow::{bail, Result};
use chrono::NaiveDate;

/// Style de tirage : ensemble de numéros distincts, ou positions de chiffres
/// indépendantes (répétitions possibles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    Set,
    Digits,
}

/// Forme canonique d'un jeu : domaine, arité, ère courante.
///
/// `main_pick` est le nombre de valeurs tirées par l'opérateur ;
/// `ticket_pick` le nombre de numéros cochés par le joueur (identique sauf
/// pour les jeux de type keno où l'on coche 10 numéros sur 20 tirés).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeConfig {
    pub era_start: NaiveDate,
    pub main_domain: u8,
    pub main_pick: usize,
    pub special_domain: u8,
    pub ticket_pick: usize,
    pub style: DrawStyle,
    pub label: &'static str,
}

impl ShapeConfig {
    pub fn value_in_range(&self, v: u8) -> bool {
        match self.style {
            DrawStyle::Set => v >= 1 && v <= self.main_domain,
            DrawStyle::Digits => v < self.main_domain,
        }
    }

    pub fn domain_label(&self) -> String {
        match self.style {
            DrawStyle::Set => format!("1-{}", self.main_domain),
            DrawStyle::Digits => format!("0-{}", self.main_domain - 1),
        }
    }

    pub fn has_special(&self) -> bool {
        self.special_domain > 0
    }
}

/// Groupe statistique canonique : les variantes midi/soir d'un même jeu
/// partagent un seul domaine réel, donc un seul historique et un seul cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameGroup {
    Powerball,
    MegaMillions,
    Cash4Life,
    Lotto,
    Take5,
    Numbers,
    Win4,
    Pick10,
    QuickDraw,
    Pop,
}

impl GameGroup {
    /// Clé opaque utilisée pour le cache et la transformation de chemin distant.
    pub fn key(&self) -> &'static str {
        match self {
            GameGroup::Powerball => "powerball",
            GameGroup::MegaMillions => "megamillions",
            GameGroup::Cash4Life => "cash4life",
            GameGroup::Lotto => "lotto",
            GameGroup::Take5 => "take5",
            GameGroup::Numbers => "numbers",
            GameGroup::Win4 => "win4",
            GameGroup::Pick10 => "pick10",
            GameGroup::QuickDraw => "quickdraw",
            GameGroup::Pop => "pop",
        }
    }
}

/// Identifiant de jeu tel qu'exposé aux appelants. Plusieurs identifiants
/// (représentant, variante midi/soir) se résolvent sur le même groupe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Game {
    Powerball,
    MegaMillions,
    Cash4Life,
    Lotto,
    Take5Midday,
    Take5Evening,
    NumbersMidday,
    NumbersEvening,
    Win4Midday,
    Win4Evening,
    Pick10,
    QuickDraw,
    Pop,
}

fn era(y: i32, m: u32, d: u32) -> NaiveDate {
    // Table statique : toutes les dates sont des littéraux valides.
    NaiveDate::from_ymd_opt(y, m, d).expect("date d'ère invalide dans la table des jeux")
}

impl Game {
    pub fn all() -> &'static [Game] {
        &[
            Game::Powerball,
            Game::MegaMillions,
            Game::Cash4Life,
            Game::Lotto,
            Game::Take5Midday,
            Game::Take5Evening,
            Game::NumbersMidday,
            Game::NumbersEvening,
            Game::Win4Midday,
            Game::Win4Evening,
            Game::Pick10,
            Game::QuickDraw,
            Game::Pop,
        ]
    }

    /// Identifiant canonique, tel qu'accepté par `from_id`.
    pub fn id(&self) -> &'static str {
        match self {
            Game::Powerball => "powerball",
            Game::MegaMillions => "megamillions",
            Game::Cash4Life => "cash4life",
            Game::Lotto => "lotto",
            Game::Take5Midday => "take5-midday",
            Game::Take5Evening => "take5-evening",
            Game::NumbersMidday => "numbers-midday",
            Game::NumbersEvening => "numbers-evening",
            Game::Win4Midday => "win4-midday",
            Game::Win4Evening => "win4-evening",
            Game::Pick10 => "pick10",
            Game::QuickDraw => "quickdraw",
            Game::Pop => "pop",
        }
    }

    /// Résout un identifiant textuel. Un identifiant inconnu est une erreur
    /// de programmation : elle est toujours propagée, jamais rattrapée.
    pub fn from_id(id: &str) -> Result<Game> {
        let norm: String = id
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let game = match norm.as_str() {
            "powerball" => Game::Powerball,
            "megamillions" | "megamillion" => Game::MegaMillions,
            "cash4life" | "cashforlife" => Game::Cash4Life,
            "lotto" | "nylotto" => Game::Lotto,
            "take5" | "take5midday" => Game::Take5Midday,
            "take5evening" => Game::Take5Evening,
            "numbers" | "numbersmidday" | "dailynumbers" => Game::NumbersMidday,
            "numbersevening" => Game::NumbersEvening,
            "win4" | "win4midday" => Game::Win4Midday,
            "win4evening" => Game::Win4Evening,
            "pick10" => Game::Pick10,
            "quickdraw" | "keno" => Game::QuickDraw,
            "pop" => Game::Pop,
            _ => bail!("Jeu inconnu : '{}' (voir la commande `games`)", id),
        };
        Ok(game)
    }

    pub fn group(&self) -> GameGroup {
        match self {
            Game::Powerball => GameGroup::Powerball,
            Game::MegaMillions => GameGroup::MegaMillions,
            Game::Cash4Life => GameGroup::Cash4Life,
            Game::Lotto => GameGroup::Lotto,
            Game::Take5Midday | Game::Take5Evening => GameGroup::Take5,
            Game::NumbersMidday | Game::NumbersEvening => GameGroup::Numbers,
            Game::Win4Midday | Game::Win4Evening => GameGroup::Win4,
            Game::Pick10 => GameGroup::Pick10,
            Game::QuickDraw => GameGroup::QuickDraw,
            Game::Pop => GameGroup::Pop,
        }
    }

    /// Forme du tirage pour l'ère courante du groupe.
    pub fn shape(&self) -> ShapeConfig {
        match self.group() {
            GameGroup::Powerball => ShapeConfig {
                era_start: era(2015, 10, 7),
                main_domain: 69,
                main_pick: 5,
                special_domain: 26,
                ticket_pick: 5,
                style: DrawStyle::Set,
                label: "Powerball (5/69 + 1/26)",
            },
            GameGroup::MegaMillions => ShapeConfig {
                era_start: era(2017, 10, 31),
                main_domain: 70,
                main_pick: 5,
                special_domain: 25,
                ticket_pick: 5,
                style: DrawStyle::Set,
                label: "Mega Millions (5/70 + 1/25)",
            },
            GameGroup::Cash4Life => ShapeConfig {
                era_start: era(2014, 6, 16),
                main_domain: 60,
                main_pick: 5,
                special_domain: 4,
                ticket_pick: 5,
                style: DrawStyle::Set,
                label: "Cash4Life (5/60 + 1/4)",
            },
            GameGroup::Lotto => ShapeConfig {
                era_start: era(2001, 9, 12),
                main_domain: 59,
                main_pick: 6,
                special_domain: 0,
                ticket_pick: 6,
                style: DrawStyle::Set,
                label: "Lotto (6/59)",
            },
            GameGroup::Take5 => ShapeConfig {
                era_start: era(1992, 1, 17),
                main_domain: 39,
                main_pick: 5,
                special_domain: 0,
                ticket_pick: 5,
                style: DrawStyle::Set,
                label: "Take 5 (5/39)",
            },
            GameGroup::Numbers => ShapeConfig {
                era_start: era(1980, 9, 2),
                main_domain: 10,
                main_pick: 3,
                special_domain: 0,
                ticket_pick: 3,
                style: DrawStyle::Digits,
                label: "Numbers (3 chiffres 0-9)",
            },
            GameGroup::Win4 => ShapeConfig {
                era_start: era(1981, 3, 2),
                main_domain: 10,
                main_pick: 4,
                special_domain: 0,
                ticket_pick: 4,
                style: DrawStyle::Digits,
                label: "Win 4 (4 chiffres 0-9)",
            },
            GameGroup::Pick10 => ShapeConfig {
                era_start: era(1987, 9, 1),
                main_domain: 80,
                main_pick: 20,
                special_domain: 0,
                ticket_pick: 10,
                style: DrawStyle::Set,
                label: "Pick 10 (20 tirés / 80, 10 cochés)",
            },
            GameGroup::QuickDraw => ShapeConfig {
                era_start: era(1995, 9, 1),
                main_domain: 80,
                main_pick: 20,
                special_domain: 0,
                ticket_pick: 10,
                style: DrawStyle::Set,
                label: "Quick Draw (keno 20/80)",
            },
            GameGroup::Pop => ShapeConfig {
                era_start: era(2023, 7, 31),
                main_domain: 15,
                main_pick: 1,
                special_domain: 0,
                ticket_pick: 1,
                style: DrawStyle::Set,
                label: "Pop (1/15)",
            },
        }
    }
}
