mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use multiloto_core::models::{validate_ticket, DrawRow, Ticket};
use multiloto_core::parse::write_fixed_schema;
use multiloto_core::registry::Game;
use multiloto_core::stats::{main_stats, special_stats};
use multiloto_core::ticket::{date_seed, generate_tickets, ticket_hints};
use multiloto_core::weights::{build_weights, WeightMode};
use multiloto_store::store::{db_path, SqliteStore};
use multiloto_sync::reconcile::{CancelToken, DateFilter, Reconciler, SyncConfig};
use multiloto_sync::source::HttpSource;

use crate::display::{
    display_draws, display_games, display_hints, display_stats, display_sync_summary,
    display_tickets,
};

#[derive(Parser)]
#[command(name = "multiloto", about = "Analyse d'historiques et génération pondérée multi-loteries")]
struct Cli {
    /// Base des fichiers de tirages distants
    #[arg(
        long,
        env = "MULTILOTO_BASE_URL",
        default_value = "https://data.lottery-mirror.net/csv"
    )]
    base_url: String,

    /// Chemin de la base de cache (défaut : ./data/multiloto.db)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lister les jeux connus et leurs formes
    Games,

    /// Synchroniser l'historique d'un jeu avec la source distante
    Sync {
        /// Identifiant du jeu (ex : powerball, take5-midday)
        game: String,
    },

    /// Lister les derniers tirages
    List {
        game: String,
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Afficher fréquences, retards et z-scores
    Stats {
        game: String,
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "200")]
        window: usize,
    },

    /// Générer des grilles par échantillonnage pondéré
    Generate {
        game: String,
        /// Biais : hot (fréquents) ou cold (en retard)
        #[arg(short, long, default_value = "hot")]
        mode: WeightMode,
        /// Force du biais, 0 = uniforme, 1 = plein biais (borné par jeu)
        #[arg(short, long, default_value = "0.6")]
        alpha: f64,
        /// Nombre de grilles
        #[arg(short, long, default_value = "3")]
        count: usize,
        /// Ne pas écarter les motifs trop joués (suites, dates, ...)
        #[arg(long)]
        keep_common: bool,
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "200")]
        window: usize,
        /// Seed pour la reproductibilité (défaut : date du jour)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Étiqueter une grille déjà choisie (chaud/froid, motifs)
    Hints {
        game: String,
        /// Numéros principaux
        #[arg(required = true)]
        numbers: Vec<u8>,
        /// Numéro spécial le cas échéant
        #[arg(short, long)]
        special: Option<u8>,
    },

    /// Exporter l'historique en cache au schéma canonique
    Export {
        game: String,
        #[arg(short, long, default_value = "export.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "multiloto=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let path = cli.db.clone().unwrap_or_else(db_path);
    let store = Arc::new(SqliteStore::open(&path)?);
    let source = Arc::new(HttpSource::new(&cli.base_url));
    let reconciler = Reconciler::new(store, source, SyncConfig::default());

    match cli.command {
        Command::Games => {
            display_games();
            Ok(())
        }
        Command::Sync { game } => cmd_sync(&reconciler, &game).await,
        Command::List { game, last } => cmd_list(&reconciler, &game, last).await,
        Command::Stats { game, window } => cmd_stats(&reconciler, &game, window).await,
        Command::Generate {
            game,
            mode,
            alpha,
            count,
            keep_common,
            window,
            seed,
        } => cmd_generate(&reconciler, &game, mode, alpha, count, !keep_common, window, seed).await,
        Command::Hints {
            game,
            numbers,
            special,
        } => cmd_hints(&reconciler, &game, numbers, special).await,
        Command::Export { game, output } => cmd_export(&reconciler, &game, &output).await,
    }
}

async fn fetch_rows(reconciler: &Reconciler, id: &str) -> Result<(Game, Vec<DrawRow>)> {
    let game = Game::from_id(id)?;
    let rows = reconciler
        .fetch_rows(game, &DateFilter::default(), &CancelToken::new())
        .await?;
    Ok((game, rows))
}

fn window_of(rows: &[DrawRow], window: usize) -> &[DrawRow] {
    &rows[rows.len().saturating_sub(window)..]
}

async fn cmd_sync(reconciler: &Reconciler, id: &str) -> Result<()> {
    let (game, rows) = fetch_rows(reconciler, id).await?;
    display_sync_summary(&game.shape(), &rows);
    Ok(())
}

async fn cmd_list(reconciler: &Reconciler, id: &str, last: usize) -> Result<()> {
    let (game, rows) = fetch_rows(reconciler, id).await?;
    let shape = game.shape();
    let recent = window_of(&rows, last);
    // Les plus récents en premier, comme sur les affichages officiels
    let mut recent: Vec<DrawRow> = recent.to_vec();
    recent.reverse();
    display_draws(&recent, &shape);
    Ok(())
}

async fn cmd_stats(reconciler: &Reconciler, id: &str, window: usize) -> Result<()> {
    let (game, rows) = fetch_rows(reconciler, id).await?;
    let shape = game.shape();
    let rows = window_of(&rows, window);

    println!(
        "\n📊 {} : statistiques sur les {} derniers tirages",
        shape.label,
        rows.len()
    );

    let stats = main_stats(&shape, rows);
    display_stats(&stats, &shape, "Numéros principaux");

    if let Some(stats) = special_stats(&shape, rows) {
        display_stats(&stats, &shape, "Numéro spécial");
    }
    Ok(())
}

async fn cmd_generate(
    reconciler: &Reconciler,
    id: &str,
    mode: WeightMode,
    alpha: f64,
    count: usize,
    avoid_common: bool,
    window: usize,
    seed: Option<u64>,
) -> Result<()> {
    let (game, rows) = fetch_rows(reconciler, id).await?;
    let shape = game.shape();
    let rows = window_of(&rows, window);

    let stats = main_stats(&shape, rows);
    let main_weights = build_weights(stats.domain, &stats.counts, mode, alpha);
    let special = special_stats(&shape, rows);
    let special_weights = special
        .as_ref()
        .map(|s| build_weights(s.domain, &s.counts, mode, alpha));

    let seed = seed.unwrap_or_else(date_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let min_diff = if shape.ticket_pick >= 4 { 2 } else { 0 };
    let tickets = generate_tickets(
        &shape,
        &main_weights,
        special_weights.as_deref(),
        count,
        avoid_common,
        min_diff,
        &mut rng,
    );

    println!(
        "\n🎯 {} : {} grille(s), mode {:?}, alpha {}, seed {}",
        shape.label, tickets.len(), mode, alpha, seed
    );
    let annotated: Vec<_> = tickets
        .into_iter()
        .map(|t| {
            let hints = ticket_hints(&t, &stats, &shape);
            (t, hints)
        })
        .collect();
    display_tickets(&annotated, &shape);
    Ok(())
}

async fn cmd_hints(
    reconciler: &Reconciler,
    id: &str,
    numbers: Vec<u8>,
    special: Option<u8>,
) -> Result<()> {
    let (game, rows) = fetch_rows(reconciler, id).await?;
    let shape = game.shape();

    let ticket = Ticket {
        mains: numbers,
        special,
    };
    validate_ticket(&ticket, &shape)?;

    let stats = main_stats(&shape, &rows);
    let hints = ticket_hints(&ticket, &stats, &shape);
    display_hints(&ticket, &hints, &shape);
    Ok(())
}

async fn cmd_export(reconciler: &Reconciler, id: &str, output: &PathBuf) -> Result<()> {
    let (game, rows) = fetch_rows(reconciler, id).await?;
    let shape = game.shape();
    let text = write_fixed_schema(&rows, &shape);
    std::fs::write(output, text)
        .with_context(|| format!("Impossible d'écrire {:?}", output))?;
    println!("{} tirages exportés vers {}", rows.len(), output.display());
    Ok(())
}
