use chrono::Datelike;
use rand::Rng;

use crate::models::{Ticket, TicketHint};
use crate::registry::{DrawStyle, ShapeConfig};
use crate::stats::DomainStats;

/// Budget de re-tirage quand l'évitement des motifs courants est demandé.
/// Au-delà, la dernière grille tirée est acceptée telle quelle : l'évitement
/// est un meilleur-effort, jamais une garantie.
pub const MAX_GENERATION_ATTEMPTS: usize = 50;

/// En-dessous de cette masse résiduelle, le tirage pondéré bascule sur un
/// choix uniforme parmi les candidats restants (jamais de blocage).
const WEIGHT_UNDERFLOW: f64 = 1e-12;

/// Seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

fn roulette_pick<R: Rng>(available: &[(u8, f64)], rng: &mut R) -> usize {
    let total: f64 = available.iter().map(|(_, w)| *w).sum();
    if total <= WEIGHT_UNDERFLOW {
        return rng.random_range(0..available.len());
    }
    let mut x = rng.random_range(0.0..total);
    for (i, (_, w)) in available.iter().enumerate() {
        if x < *w {
            return i;
        }
        x -= *w;
    }
    available.len() - 1
}

/// Tirage pondéré sans remise par roulette sur somme cumulée. Retourne
/// exactement `min(pick, domaine)` numéros distincts 1-based, triés.
pub fn weighted_sample_distinct<R: Rng>(pick: usize, weights: &[f64], rng: &mut R) -> Vec<u8> {
    let mut available: Vec<(u8, f64)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| ((i + 1) as u8, w.max(0.0)))
        .collect();
    let count = pick.min(available.len());

    let mut selected = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = roulette_pick(&available, rng);
        let (number, _) = available.remove(idx);
        selected.push(number);
    }
    selected.sort();
    selected
}

/// Tirage pondéré d'un seul numéro 1-based (avec remise côté appelant).
pub fn weighted_sample_one<R: Rng>(weights: &[f64], rng: &mut R) -> u8 {
    let available: Vec<(u8, f64)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| ((i + 1) as u8, w.max(0.0)))
        .collect();
    available[roulette_pick(&available, rng)].0
}

fn has_consecutive_run(sorted: &[u8], run: usize) -> bool {
    if sorted.len() < run {
        return false;
    }
    sorted
        .windows(run)
        .any(|w| w.windows(2).all(|p| p[1] == p[0] + 1))
}

fn low_number_bias(sorted: &[u8]) -> bool {
    sorted.iter().filter(|&&v| v <= 31).count() >= 4
}

fn is_arithmetic_progression(sorted: &[u8]) -> bool {
    if sorted.len() < 3 {
        return false;
    }
    let d = sorted[1] - sorted[0];
    sorted.windows(2).all(|w| w[1] - w[0] == d)
}

fn span_too_tight(sorted: &[u8], domain: u8) -> bool {
    let span = sorted[sorted.len() - 1] - sorted[0];
    span <= domain.div_ceil(7)
}

/// Motifs « joués par tout le monde » : suites, biais de dates, progressions
/// arithmétiques parfaites, numéros tous regroupés. Sans objet sous trois
/// numéros principaux.
pub fn looks_too_common(sorted_mains: &[u8], domain: u8) -> bool {
    if sorted_mains.len() < 3 {
        return false;
    }
    has_consecutive_run(sorted_mains, 3)
        || low_number_bias(sorted_mains)
        || is_arithmetic_progression(sorted_mains)
        || span_too_tight(sorted_mains, domain)
}

/// Tire une grille complète (principaux + spécial le cas échéant).
///
/// Les jeux à chiffres tirent chaque position indépendamment, avec remise.
/// Pour les jeux à ensemble, `avoid_common` rejette et re-tire (borné par
/// `MAX_GENERATION_ATTEMPTS`) tant que la grille ressemble à un motif courant.
pub fn generate_ticket<R: Rng>(
    shape: &ShapeConfig,
    main_weights: &[f64],
    special_weights: Option<&[f64]>,
    avoid_common: bool,
    rng: &mut R,
) -> Ticket {
    let mains = match shape.style {
        DrawStyle::Digits => (0..shape.ticket_pick)
            .map(|_| weighted_sample_one(main_weights, rng) - 1)
            .collect(),
        DrawStyle::Set => {
            let mut mains = weighted_sample_distinct(shape.ticket_pick, main_weights, rng);
            if avoid_common {
                let mut attempts = 1;
                while attempts < MAX_GENERATION_ATTEMPTS
                    && looks_too_common(&mains, shape.main_domain)
                {
                    mains = weighted_sample_distinct(shape.ticket_pick, main_weights, rng);
                    attempts += 1;
                }
            }
            mains
        }
    };

    let special = match (shape.has_special(), special_weights) {
        (true, Some(w)) => Some(weighted_sample_one(w, rng)),
        _ => None,
    };

    Ticket { mains, special }
}

/// Nombre de numéros de `a` absents de `b`.
fn main_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().filter(|x| !b.contains(x)).count()
}

/// Génère `count` grilles en écartant gloutonnement les quasi-doublons
/// (au moins `min_diff` numéros principaux d'écart entre chaque paire).
pub fn generate_tickets<R: Rng>(
    shape: &ShapeConfig,
    main_weights: &[f64],
    special_weights: Option<&[f64]>,
    count: usize,
    avoid_common: bool,
    min_diff: usize,
    rng: &mut R,
) -> Vec<Ticket> {
    let candidates: Vec<Ticket> = (0..count.max(1) * 10)
        .map(|_| generate_ticket(shape, main_weights, special_weights, avoid_common, rng))
        .collect();

    let mut selected: Vec<Ticket> = Vec::with_capacity(count);
    for candidate in &candidates {
        if selected.len() >= count {
            break;
        }
        let dominated = selected
            .iter()
            .any(|t| main_distance(&candidate.mains, &t.mains) < min_diff);
        if !dominated {
            selected.push(candidate.clone());
        }
    }

    // Repli : compléter avec les candidats restants non identiques
    if selected.len() < count {
        for candidate in &candidates {
            if selected.len() >= count {
                break;
            }
            if !selected.iter().any(|t| t == candidate) {
                selected.push(candidate.clone());
            }
        }
    }

    selected
}

/// Classe une grille déjà choisie contre les mêmes signaux motifs/z-score.
/// Purement descriptif ; « équilibrée » quand rien d'autre ne s'applique.
pub fn ticket_hints(ticket: &Ticket, main_stats: &DomainStats, shape: &ShapeConfig) -> Vec<TicketHint> {
    let mut hints = Vec::new();

    let lookup: Vec<u8> = match shape.style {
        DrawStyle::Set => ticket.mains.clone(),
        DrawStyle::Digits => ticket.mains.iter().map(|&v| v + 1).collect(),
    };
    let majority = (lookup.len() + 1) / 2;
    let hot = lookup
        .iter()
        .filter(|&&n| main_stats.tag(n) == crate::models::NumberTag::Hot)
        .count();
    let cold = lookup
        .iter()
        .filter(|&&n| main_stats.tag(n) == crate::models::NumberTag::Cold)
        .count();
    if hot >= majority {
        hints.push(TicketHint::HotHeavy);
    }
    if cold >= majority {
        hints.push(TicketHint::ColdHeavy);
    }

    if shape.style == DrawStyle::Set && ticket.mains.len() >= 3 {
        let mut sorted = ticket.mains.clone();
        sorted.sort();
        if has_consecutive_run(&sorted, 3) {
            hints.push(TicketHint::ConsecutiveRun);
        }
        if low_number_bias(&sorted) {
            hints.push(TicketHint::LowNumberBias);
        }
        if is_arithmetic_progression(&sorted) {
            hints.push(TicketHint::ArithmeticProgression);
        }
        if span_too_tight(&sorted, shape.main_domain) {
            hints.push(TicketHint::TightCluster);
        }
    }

    if hints.is_empty() {
        hints.push(TicketHint::Balanced);
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Game;
    use crate::stats::compute_stats;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_date_seed_is_eight_digits() {
        let seed = date_seed();
        assert!(seed >= 20_000_000, "seed trop petit : {seed}");
        assert!(seed <= 99_991_231, "seed trop grand : {seed}");
    }

    #[test]
    fn test_sample_distinct_count_and_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let weights = vec![1.0 / 69.0; 69];
        for _ in 0..50 {
            let picked = weighted_sample_distinct(5, &weights, &mut rng);
            assert_eq!(picked.len(), 5);
            assert!(picked.iter().all(|&n| (1..=69).contains(&n)));
            assert!(picked.windows(2).all(|w| w[0] < w[1]), "trié et distinct");
        }
    }

    #[test]
    fn test_sample_distinct_pick_larger_than_domain() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = vec![0.25; 4];
        let picked = weighted_sample_distinct(10, &weights, &mut rng);
        assert_eq!(picked, vec![1, 2, 3, 4], "min(pick, domaine) valeurs");
    }

    #[test]
    fn test_sample_distinct_all_zero_weights_never_stalls() {
        let mut rng = StdRng::seed_from_u64(99);
        let weights = vec![0.0; 12];
        let picked = weighted_sample_distinct(5, &weights, &mut rng);
        assert_eq!(picked.len(), 5);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sample_determinism_under_fixed_seed() {
        let weights: Vec<f64> = (1..=50).map(|i| i as f64).collect();
        let a = weighted_sample_distinct(5, &weights, &mut StdRng::seed_from_u64(123));
        let b = weighted_sample_distinct(5, &weights, &mut StdRng::seed_from_u64(123));
        assert_eq!(a, b);
    }

    #[test]
    fn test_heavily_skewed_weights_pick_dominant_number() {
        let mut weights = vec![1e-9; 50];
        weights[24] = 1.0;
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let picked = weighted_sample_distinct(1, &weights, &mut rng);
            assert_eq!(picked, vec![25]);
        }
    }

    #[test]
    fn test_looks_too_common_flags() {
        // suite de 3
        assert!(looks_too_common(&[4, 5, 6, 20, 40], 69));
        // ≥4 numéros ≤ 31 (biais dates)
        assert!(looks_too_common(&[3, 8, 14, 27, 55], 69));
        // progression arithmétique parfaite
        assert!(looks_too_common(&[5, 15, 25, 35, 45], 69));
        // regroupement serré (écart ≤ ⌈69/7⌉ = 10)
        assert!(looks_too_common(&[40, 42, 44, 47, 50], 69));
        // grille quelconque bien étalée
        assert!(!looks_too_common(&[2, 17, 33, 48, 64], 69));
    }

    #[test]
    fn test_looks_too_common_ignores_tiny_tickets() {
        assert!(!looks_too_common(&[7], 15));
        assert!(!looks_too_common(&[7, 8], 15));
    }

    #[test]
    fn test_generate_ticket_set_style() {
        let shape = Game::Powerball.shape();
        let main_w = vec![1.0 / 69.0; 69];
        let special_w = vec![1.0 / 26.0; 26];
        let mut rng = StdRng::seed_from_u64(2024);
        let ticket = generate_ticket(&shape, &main_w, Some(&special_w), true, &mut rng);
        assert_eq!(ticket.mains.len(), 5);
        assert!(ticket.mains.windows(2).all(|w| w[0] < w[1]));
        let s = ticket.special.unwrap();
        assert!((1..=26).contains(&s));
    }

    #[test]
    fn test_generate_ticket_digits_allows_repeats() {
        let shape = Game::Win4Midday.shape();
        // poids écrasés sur le chiffre 7 : les quatre positions le répètent
        let mut weights = vec![1e-12; 10];
        weights[7] = 1.0;
        let mut rng = StdRng::seed_from_u64(1);
        let ticket = generate_ticket(&shape, &weights, None, false, &mut rng);
        assert_eq!(ticket.mains, vec![7, 7, 7, 7]);
        assert!(ticket.special.is_none());
    }

    #[test]
    fn test_generation_exhausted_still_returns_a_ticket() {
        // Domaine minuscule : toute grille de 3 parmi 4 est « trop commune »
        // (suite quasi garantie). Le budget s'épuise et la dernière grille
        // est acceptée quand même.
        let shape = Game::Pop.shape();
        let mut tight = shape;
        tight.ticket_pick = 3;
        let weights = vec![0.25; 4];
        let mut rng = StdRng::seed_from_u64(8);
        let ticket = generate_ticket(&tight, &weights[..4], None, true, &mut rng);
        assert_eq!(ticket.mains.len(), 3);
    }

    #[test]
    fn test_generate_tickets_diversity() {
        let shape = Game::Take5Midday.shape();
        let weights = vec![1.0 / 39.0; 39];
        let mut rng = StdRng::seed_from_u64(77);
        let tickets = generate_tickets(&shape, &weights, None, 5, false, 2, &mut rng);
        assert_eq!(tickets.len(), 5);
        for i in 0..tickets.len() {
            for j in (i + 1)..tickets.len() {
                assert!(
                    main_distance(&tickets[i].mains, &tickets[j].mains) >= 2,
                    "grilles {} et {} trop proches : {:?} vs {:?}",
                    i,
                    j,
                    tickets[i].mains,
                    tickets[j].mains
                );
            }
        }
    }

    #[test]
    fn test_ticket_hints_balanced_by_default() {
        let shape = Game::Powerball.shape();
        let stats = compute_stats(&[], 5, 69);
        let ticket = Ticket {
            mains: vec![2, 17, 33, 48, 64],
            special: Some(7),
        };
        assert_eq!(ticket_hints(&ticket, &stats, &shape), vec![TicketHint::Balanced]);
    }

    #[test]
    fn test_ticket_hints_pattern_flags() {
        let shape = Game::Powerball.shape();
        let stats = compute_stats(&[], 5, 69);
        let ticket = Ticket {
            mains: vec![4, 5, 6, 20, 40],
            special: None,
        };
        let hints = ticket_hints(&ticket, &stats, &shape);
        assert!(hints.contains(&TicketHint::ConsecutiveRun));
        assert!(!hints.contains(&TicketHint::Balanced));
    }

    #[test]
    fn test_ticket_hints_hot_heavy() {
        // Trois tirages où 1, 2, 3 sortent toujours : nettement chauds
        let draws = vec![vec![1, 2, 3], vec![1, 2, 3], vec![1, 2, 3]];
        let stats = compute_stats(&draws, 3, 20);
        let shape = {
            let mut s = Game::Take5Midday.shape();
            s.main_domain = 20;
            s.ticket_pick = 3;
            s.main_pick = 3;
            s
        };
        let ticket = Ticket {
            mains: vec![1, 2, 3],
            special: None,
        };
        let hints = ticket_hints(&ticket, &stats, &shape);
        assert!(hints.contains(&TicketHint::HotHeavy));
    }
}
