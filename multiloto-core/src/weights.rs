use clap::ValueEnum;

/// Biais d'échantillonnage : vers les numéros sur-représentés (chaud) ou
/// sous-représentés (froid) dans l'historique. Heuristique assumée, pas une
/// prévision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum WeightMode {
    #[default]
    Hot,
    Cold,
}

/// Lissage additif minimal, pour que les domaines à faible historique ne
/// produisent jamais de probabilité quasi nulle.
const SMOOTH_MIN: f64 = 0.05;
const SMOOTH_CAP: f64 = 1.0;

/// Epsilon d'inversion froide, garde chaque numéro tirable.
const COLD_EPSILON: f64 = 1e-6;

/// Bande alpha sûre par taille de domaine : large pour les grands domaines,
/// conservatrice pour les minuscules (Cash Ball 1-4). La borne haute est
/// divisée par deux quand l'historique observé couvre moins d'un domaine
/// entier de tirages.
pub fn alpha_band(domain: u8, total_draws: u32) -> (f64, f64) {
    let (lo, hi): (f64, f64) = match domain {
        d if d >= 40 => (0.0, 0.85),
        d if d >= 20 => (0.05, 0.75),
        d if d >= 10 => (0.10, 0.60),
        _ => (0.10, 0.40),
    };
    let hi = if (total_draws as u64) < domain as u64 {
        (hi / 2.0).max(lo)
    } else {
        hi
    };
    (lo, hi)
}

pub fn clamp_alpha(domain: u8, total_draws: u32, alpha: f64) -> f64 {
    let (lo, hi) = alpha_band(domain, total_draws);
    alpha.clamp(0.0, 1.0).clamp(lo, hi)
}

/// Convertit des comptes d'apparitions en distribution de tirage.
///
/// Fréquences lissées (`max(0.05, 5 % du compte moyen)`, plafonné),
/// inversées pour le mode froid (`(max - p) + ε` renormalisé), puis mélange
/// `(1-α)·uniforme + α·biaisée`. La sortie somme toujours à 1, y compris sur
/// un historique entièrement vide.
pub fn build_weights(domain: u8, counts: &[u32], mode: WeightMode, alpha: f64) -> Vec<f64> {
    let n = domain as usize;
    debug_assert_eq!(counts.len(), n, "comptes non denses pour le domaine");

    let total: u32 = counts.iter().sum();
    let avg = total as f64 / n as f64;
    let smooth = (0.05 * avg).max(SMOOTH_MIN).min(SMOOTH_CAP);

    let raw: Vec<f64> = counts.iter().map(|&c| c as f64 + smooth).collect();
    let sum: f64 = raw.iter().sum();
    let mut probs: Vec<f64> = raw.iter().map(|r| r / sum).collect();

    if mode == WeightMode::Cold {
        let max = probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let inverted: Vec<f64> = probs.iter().map(|p| (max - p) + COLD_EPSILON).collect();
        let inv_sum: f64 = inverted.iter().sum();
        probs = inverted.iter().map(|p| p / inv_sum).collect();
    }

    let a = clamp_alpha(domain, total, alpha);
    let uniform = 1.0 / n as f64;
    let blended: Vec<f64> = probs
        .iter()
        .map(|p| (1.0 - a) * uniform + a * p)
        .collect();
    let blended_sum: f64 = blended.iter().sum();
    blended.iter().map(|w| w / blended_sum).collect()
}
