use crate::models::{DrawRow, NumberTag};
use crate::registry::{DrawStyle, ShapeConfig};

/// Plancher de l'écart-type pour éviter une division par zéro sur les
/// échantillons minuscules ou les domaines dégénérés (k == N).
const SD_FLOOR: f64 = 1e-9;

/// Seuil de z-score pour l'étiquetage chaud/froid à l'affichage.
const Z_TAG_THRESHOLD: f64 = 1.0;

/// Statistiques denses sur un domaine 1..=N : chaque numéro est présent dans
/// `counts`, `last_seen` et `z`, sans trou, pour que les consommateurs
/// puissent afficher tout le domaine sans vérification.
#[derive(Debug, Clone)]
pub struct DomainStats {
    pub domain: u8,
    pub pick: usize,
    pub total_draws: u32,
    /// Indice 0 = numéro 1.
    pub counts: Vec<u32>,
    /// Tirages écoulés depuis la dernière apparition, 0 = tirage le plus
    /// récent. `None` = jamais vu dans la fenêtre fournie.
    pub last_seen: Vec<Option<u32>>,
    /// Vide quand aucun tirage valide (pas de modèle binomial possible).
    pub z: Vec<f64>,
}

impl DomainStats {
    pub fn count_of(&self, number: u8) -> u32 {
        self.counts[(number - 1) as usize]
    }

    pub fn last_seen_of(&self, number: u8) -> Option<u32> {
        self.last_seen[(number - 1) as usize]
    }

    pub fn z_of(&self, number: u8) -> Option<f64> {
        self.z.get((number - 1) as usize).copied()
    }

    pub fn tag(&self, number: u8) -> NumberTag {
        match self.z_of(number) {
            Some(z) if z > Z_TAG_THRESHOLD => NumberTag::Hot,
            Some(z) if z < -Z_TAG_THRESHOLD => NumberTag::Cold,
            _ => NumberTag::Normal,
        }
    }
}

/// Moteur k-parmi-N unique : compte les apparitions, l'ancienneté et le
/// z-score binomial de chaque numéro. `draws` est en ordre chronologique
/// ascendant ; le passage se fait du plus récent au plus ancien avec un index
/// « tirages écoulés » base zéro. Une ligne est valide si son arité vaut `k`
/// et toutes ses valeurs tombent dans `[1, n]` ; les lignes invalides ne
/// consomment pas d'index. Les jeux à chiffres passent par le même moteur
/// après décalage 0-9 → 1-10 (les répétitions dans une ligne comptent chacune).
pub fn compute_stats(draws: &[Vec<u8>], k: usize, n: u8) -> DomainStats {
    let size = n as usize;
    let mut counts = vec![0u32; size];
    let mut last_seen: Vec<Option<u32>> = vec![None; size];
    let mut total = 0u32;

    for values in draws.iter().rev() {
        if values.len() != k || !values.iter().all(|&v| v >= 1 && v <= n) {
            continue;
        }
        let ago = total;
        for &v in values {
            let idx = (v - 1) as usize;
            counts[idx] += 1;
            if last_seen[idx].is_none() {
                last_seen[idx] = Some(ago);
            }
        }
        total += 1;
    }

    let z = if total == 0 {
        Vec::new()
    } else {
        let p = k as f64 / n as f64;
        let expected = total as f64 * p;
        let sd = (total as f64 * p * (1.0 - p)).sqrt().max(SD_FLOOR);
        counts
            .iter()
            .map(|&c| (c as f64 - expected) / sd)
            .collect()
    };

    DomainStats {
        domain: n,
        pick: k,
        total_draws: total,
        counts,
        last_seen,
        z,
    }
}

/// Adaptateur numéros principaux : ne fait que remettre les lignes en forme,
/// jamais recompter. Les chiffres 0-9 sont décalés vers 1-10.
pub fn main_stats(shape: &ShapeConfig, rows: &[DrawRow]) -> DomainStats {
    let draws: Vec<Vec<u8>> = rows
        .iter()
        .map(|r| match shape.style {
            DrawStyle::Set => r.values.clone(),
            DrawStyle::Digits => r.values.iter().map(|&v| v + 1).collect(),
        })
        .collect();
    compute_stats(&draws, shape.main_pick, shape.main_domain)
}

/// Adaptateur numéro spécial : un tirage 1-parmi-`special_domain` par ligne.
pub fn special_stats(shape: &ShapeConfig, rows: &[DrawRow]) -> Option<DomainStats> {
    if !shape.has_special() {
        return None;
    }
    let draws: Vec<Vec<u8>> = rows
        .iter()
        .filter_map(|r| r.special.map(|s| vec![s]))
        .collect();
    Some(compute_stats(&draws, 1, shape.special_domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Game;
    use chrono::NaiveDate;

    fn row(date: &str, values: &[u8], special: Option<u8>) -> DrawRow {
        DrawRow {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            values: values.to_vec(),
            special,
        }
    }

    #[test]
    fn test_density_invariant() {
        let draws = vec![vec![1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10]];
        let stats = compute_stats(&draws, 5, 39);
        assert_eq!(stats.counts.len(), 39);
        assert_eq!(stats.last_seen.len(), 39);
        assert_eq!(stats.z.len(), 39);
    }

    #[test]
    fn test_counts_sum_equals_draws_times_k() {
        let draws = vec![
            vec![1, 2, 3, 4, 5],
            vec![6, 7, 8, 9, 10],
            vec![1, 3, 5, 7, 9],
        ];
        let stats = compute_stats(&draws, 5, 39);
        let sum: u32 = stats.counts.iter().sum();
        assert_eq!(sum, 3 * 5);
    }

    #[test]
    fn test_last_seen_convention() {
        // Ordre ascendant : la dernière ligne est le tirage le plus récent.
        let draws = vec![vec![1, 2], vec![3, 4], vec![5, 6]];
        let stats = compute_stats(&draws, 2, 10);
        assert_eq!(stats.last_seen_of(5), Some(0));
        assert_eq!(stats.last_seen_of(3), Some(1));
        assert_eq!(stats.last_seen_of(1), Some(2));
        assert_eq!(stats.last_seen_of(10), None, "jamais vu = None");
    }

    #[test]
    fn test_most_recent_occurrence_wins() {
        let draws = vec![vec![7, 1], vec![7, 2], vec![3, 4]];
        let stats = compute_stats(&draws, 2, 10);
        assert_eq!(stats.count_of(7), 2);
        assert_eq!(stats.last_seen_of(7), Some(1));
    }

    #[test]
    fn test_invalid_rows_do_not_consume_index() {
        let draws = vec![
            vec![1, 2],
            vec![99, 2], // hors domaine
            vec![3],     // arité fausse
            vec![5, 6],
        ];
        let stats = compute_stats(&draws, 2, 10);
        assert_eq!(stats.total_draws, 2);
        assert_eq!(stats.last_seen_of(5), Some(0));
        assert_eq!(stats.last_seen_of(1), Some(1));
    }

    #[test]
    fn test_zero_draws_edge_case() {
        let stats = compute_stats(&[], 5, 69);
        assert_eq!(stats.total_draws, 0);
        assert!(stats.counts.iter().all(|&c| c == 0));
        assert!(stats.last_seen.iter().all(|s| s.is_none()));
        assert!(stats.z.is_empty(), "pas de z sans tirage valide");
        assert_eq!(stats.tag(1), NumberTag::Normal);
    }

    #[test]
    fn test_never_seen_number_is_cold() {
        // Domaine 69, 5 par tirage, 100 tirages sans jamais le 17.
        let draws: Vec<Vec<u8>> = (0..100)
            .map(|i| {
                let base = (i % 10) as u8;
                vec![base + 1, base + 21, base + 31, base + 41, base + 51]
            })
            .collect();
        let stats = compute_stats(&draws, 5, 69);
        assert_eq!(stats.total_draws, 100);
        assert_eq!(stats.count_of(17), 0);
        assert_eq!(stats.last_seen_of(17), None);
        let z17 = stats.z_of(17).unwrap();
        let expected = 100.0 * 5.0 / 69.0;
        let sd = (100.0_f64 * (5.0 / 69.0) * (1.0 - 5.0 / 69.0)).sqrt();
        assert!((z17 - (0.0 - expected) / sd).abs() < 1e-10);
        assert!(z17 < 0.0, "absent de tout l'historique = froid");
        assert_eq!(stats.tag(17), NumberTag::Cold);
    }

    #[test]
    fn test_degenerate_k_equals_n() {
        // Chaque numéro sort à chaque tirage : sd plancher, z nul.
        let draws = vec![vec![1, 2, 3], vec![1, 2, 3]];
        let stats = compute_stats(&draws, 3, 3);
        for n in 1..=3u8 {
            assert!(stats.z_of(n).unwrap().abs() < 1e-6);
        }
    }

    #[test]
    fn test_digit_adapter_counts_repeats() {
        let shape = Game::NumbersMidday.shape();
        let rows = vec![
            row("2024-01-01", &[7, 7, 7], None),
            row("2024-01-02", &[0, 7, 9], None),
        ];
        let stats = main_stats(&shape, &rows);
        // chiffre 7 = numéro décalé 8, trois occurrences + une
        assert_eq!(stats.count_of(8), 4);
        // chiffre 0 = numéro décalé 1
        assert_eq!(stats.count_of(1), 1);
        let sum: u32 = stats.counts.iter().sum();
        assert_eq!(sum, 2 * 3);
    }

    #[test]
    fn test_special_adapter() {
        let shape = Game::Powerball.shape();
        let rows = vec![
            row("2024-01-01", &[1, 2, 3, 4, 5], Some(7)),
            row("2024-01-02", &[6, 7, 8, 9, 10], Some(7)),
            row("2024-01-03", &[1, 3, 5, 7, 9], Some(26)),
        ];
        let stats = special_stats(&shape, &rows).unwrap();
        assert_eq!(stats.domain, 26);
        assert_eq!(stats.count_of(7), 2);
        assert_eq!(stats.last_seen_of(26), Some(0));
        assert_eq!(stats.last_seen_of(7), Some(1));
    }

    #[test]
    fn test_special_adapter_absent_for_plain_games() {
        let shape = Game::Take5Midday.shape();
        assert!(special_stats(&shape, &[]).is_none());
    }
}
