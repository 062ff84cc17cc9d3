use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use multiloto_core::models::{DrawRow, NumberTag, Ticket, TicketHint};
use multiloto_core::registry::{DrawStyle, Game, ShapeConfig};
use multiloto_core::stats::DomainStats;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Les jeux à chiffres s'affichent 0-9 ; les numéros internes sont décalés.
fn display_number(shape: &ShapeConfig, n: u8) -> u8 {
    match shape.style {
        DrawStyle::Set => n,
        DrawStyle::Digits => n - 1,
    }
}

fn format_values(values: &[u8], style: DrawStyle) -> String {
    match style {
        DrawStyle::Set => values
            .iter()
            .map(|v| format!("{:2}", v))
            .collect::<Vec<_>>()
            .join(" - "),
        DrawStyle::Digits => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

pub fn display_games() {
    let mut table = new_table(vec!["Identifiant", "Groupe", "Forme", "Ère depuis", "Spécial"]);
    for game in Game::all() {
        let shape = game.shape();
        let special = if shape.has_special() {
            format!("1-{}", shape.special_domain)
        } else {
            "—".to_string()
        };
        table.add_row(vec![
            game.id().to_string(),
            game.group().key().to_string(),
            shape.label.to_string(),
            shape.era_start.to_string(),
            special,
        ]);
    }
    println!("{table}");
}

pub fn display_draws(rows: &[DrawRow], shape: &ShapeConfig) {
    if rows.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut header = vec!["Date", "Numéros"];
    if shape.has_special() {
        header.push("Spécial");
    }
    let mut table = new_table(header);

    for row in rows {
        let mut sorted = row.values.clone();
        if shape.style == DrawStyle::Set {
            sorted.sort();
        }
        let mut cells = vec![row.date.to_string(), format_values(&sorted, shape.style)];
        if shape.has_special() {
            cells.push(
                row.special
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "—".to_string()),
            );
        }
        table.add_row(cells);
    }
    println!("{table}");
}

pub fn display_stats(stats: &DomainStats, shape: &ShapeConfig, title: &str) {
    println!("\n── {} ──", title);
    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard", "Z", "Tag"]);

    let mut numbers: Vec<u8> = (1..=stats.domain).collect();
    numbers.sort_by(|a, b| stats.count_of(*b).cmp(&stats.count_of(*a)));

    for n in numbers {
        let gap = match stats.last_seen_of(n) {
            Some(g) => g.to_string(),
            None => "jamais".to_string(),
        };
        let z = match stats.z_of(n) {
            Some(z) => format!("{:+.2}", z),
            None => "—".to_string(),
        };
        let tag = stats.tag(n);
        let color = match tag {
            NumberTag::Hot => Color::Green,
            NumberTag::Cold => Color::Red,
            NumberTag::Normal => Color::White,
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", display_number(shape, n))),
            Cell::new(stats.count_of(n).to_string()),
            Cell::new(gap),
            Cell::new(z),
            Cell::new(tag.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_tickets(tickets: &[(Ticket, Vec<TicketHint>)], shape: &ShapeConfig) {
    println!("\n🎲 Grilles générées\n");

    let mut header = vec!["#", "Numéros"];
    if shape.has_special() {
        header.push("Spécial");
    }
    header.push("Profil");
    let mut table = new_table(header);

    for (i, (ticket, hints)) in tickets.iter().enumerate() {
        let mut cells = vec![
            format!("{}", i + 1),
            format_values(&ticket.mains, shape.style),
        ];
        if shape.has_special() {
            cells.push(
                ticket
                    .special
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "—".to_string()),
            );
        }
        cells.push(
            hints
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
        table.add_row(cells);
    }
    println!("{table}");
}

pub fn display_hints(ticket: &Ticket, hints: &[TicketHint], shape: &ShapeConfig) {
    println!(
        "Grille : {}{}",
        format_values(&ticket.mains, shape.style),
        ticket
            .special
            .map(|s| format!("  (spécial {})", s))
            .unwrap_or_default()
    );
    for hint in hints {
        println!("  • {}", hint);
    }
}

pub fn display_sync_summary(shape: &ShapeConfig, rows: &[DrawRow]) {
    println!("Synchronisation terminée : {}", shape.label);
    println!("  Tirages en cache : {}", rows.len());
    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        println!("  Période couverte : {} → {}", first.date, last.date);
    }
}
