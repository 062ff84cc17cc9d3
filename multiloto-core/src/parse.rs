use chrono::NaiveDate;
use tracing::debug;

use crate::models::DrawRow;
use crate::registry::ShapeConfig;

/// Formats de date acceptés, essayés dans l'ordre. Tout ce qui se parse est
/// ramené à la forme canonique YYYY-MM-DD.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%B %d, %Y",
];

/// Conventions de nommage des colonnes de valeurs numérotées.
const VALUE_PREFIXES: &[&str] = &["ball", "number", "num", "value", "n", "winningnumber"];

/// Alias reconnus pour la colonne du numéro spécial / bonus.
const SPECIAL_ALIASES: &[&str] = &[
    "powerball",
    "megaball",
    "cashball",
    "luckyball",
    "bonus",
    "bonusball",
    "extra",
    "special",
];

/// Alias reconnus pour une colonne texte libre contenant tous les numéros.
const FREE_TEXT_ALIASES: &[&str] = &["winningnumbers", "numbers", "results"];

pub fn parse_date_any(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_matches('"');
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Casse, espaces et underscores ne comptent pas dans les entêtes.
fn normalize_header(h: &str) -> String {
    h.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn reader_for(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn find_date_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| h.contains("date"))
}

fn find_special_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| SPECIAL_ALIASES.contains(&h.as_str()))
}

fn get_trimmed(record: &csv::StringRecord, idx: usize) -> Option<String> {
    record.get(idx).map(|s| s.trim().trim_matches('"').to_string())
}

fn parse_value(record: &csv::StringRecord, idx: usize) -> Option<u8> {
    get_trimmed(record, idx)?.parse::<u8>().ok()
}

/// Schéma canonique : une colonne de date nommée + exactement `main_pick`
/// colonnes de valeurs sous une des conventions connues + colonne spéciale
/// optionnelle. Entête irrésoluble = zéro ligne, jamais une erreur : c'est le
/// contrôle de volume minimal en aval qui signalera le fichier inutilisable.
pub fn parse_fixed_schema(text: &str, shape: &ShapeConfig) -> Vec<DrawRow> {
    let mut reader = reader_for(text);
    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(normalize_header).collect(),
        Err(_) => return Vec::new(),
    };

    let Some(date_idx) = find_date_column(&headers) else {
        return Vec::new();
    };

    let value_idx = VALUE_PREFIXES.iter().find_map(|prefix| {
        (1..=shape.main_pick)
            .map(|i| headers.iter().position(|h| *h == format!("{prefix}{i}")))
            .collect::<Option<Vec<usize>>>()
    });
    let Some(value_idx) = value_idx else {
        return Vec::new();
    };

    let special_idx = find_special_column(&headers);

    let mut rows = Vec::new();
    for record in reader.records().flatten() {
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(date) = get_trimmed(&record, date_idx).and_then(|s| parse_date_any(&s)) else {
            debug!("ligne ignorée : date illisible");
            continue;
        };
        let Some(values) = value_idx
            .iter()
            .map(|&i| parse_value(&record, i))
            .collect::<Option<Vec<u8>>>()
        else {
            debug!(%date, "ligne ignorée : valeur non numérique");
            continue;
        };
        let special = special_idx.and_then(|i| parse_value(&record, i));

        let row = DrawRow {
            date,
            values,
            special,
        };
        if !row.is_valid_for(shape) {
            debug!(%date, "ligne ignorée : hors domaine ou arité fausse");
            continue;
        }
        rows.push(row);
    }

    // Les parseurs ne font jamais confiance à l'ordre du fichier.
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    rows
}

/// Schéma flexible : colonnes numérotées `prefixe1..prefixeN` découvertes en
/// sondant les indices croissants, ou repli sur une colonne texte libre
/// découpée sur les séparateurs usuels. Aucune validation de forme ici :
/// l'appelant filtre avec `DrawRow::is_valid_for`.
pub fn parse_flexible_schema(text: &str) -> Vec<DrawRow> {
    let mut reader = reader_for(text);
    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(normalize_header).collect(),
        Err(_) => return Vec::new(),
    };

    let Some(date_idx) = find_date_column(&headers) else {
        return Vec::new();
    };

    // Sonde prefixe1, prefixe2, ... jusqu'au premier indice manquant.
    let mut value_idx: Vec<usize> = Vec::new();
    for prefix in VALUE_PREFIXES {
        if let Some(first) = headers.iter().position(|h| *h == format!("{prefix}1")) {
            value_idx.push(first);
            let mut i = 2;
            while let Some(idx) = headers.iter().position(|h| *h == format!("{prefix}{i}")) {
                value_idx.push(idx);
                i += 1;
            }
            break;
        }
    }

    let free_text_idx = if value_idx.is_empty() {
        headers
            .iter()
            .position(|h| FREE_TEXT_ALIASES.contains(&h.as_str()))
    } else {
        None
    };
    if value_idx.is_empty() && free_text_idx.is_none() {
        return Vec::new();
    }

    let special_idx = find_special_column(&headers);

    let mut rows = Vec::new();
    for record in reader.records().flatten() {
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(date) = get_trimmed(&record, date_idx).and_then(|s| parse_date_any(&s)) else {
            debug!("ligne ignorée : date illisible");
            continue;
        };

        let values = if !value_idx.is_empty() {
            value_idx
                .iter()
                .map(|&i| parse_value(&record, i))
                .collect::<Option<Vec<u8>>>()
        } else {
            free_text_idx
                .and_then(|i| get_trimmed(&record, i))
                .and_then(|s| split_free_text(&s))
        };
        let Some(values) = values else {
            debug!(%date, "ligne ignorée : valeurs non numériques");
            continue;
        };
        if values.is_empty() {
            debug!(%date, "ligne ignorée : aucune valeur");
            continue;
        }

        let special = special_idx.and_then(|i| parse_value(&record, i));
        rows.push(DrawRow {
            date,
            values,
            special,
        });
    }

    rows.sort_by(|a, b| a.date.cmp(&b.date));
    rows
}

/// Découpe « 05 12 23 », « 5-12-23 » ou « 5,12,23 » en valeurs.
fn split_free_text(s: &str) -> Option<Vec<u8>> {
    s.replace([',', ';', '-'], " ")
        .split_whitespace()
        .map(|tok| tok.parse::<u8>().ok())
        .collect()
}

/// Inverse du parseur canonique : reproduit exactement date + valeurs +
/// spécial sous les entêtes `Draw Date`, `Ball i`, `Bonus`.
pub fn write_fixed_schema(rows: &[DrawRow], shape: &ShapeConfig) -> String {
    let mut header: Vec<String> = vec!["Draw Date".to_string()];
    for i in 1..=shape.main_pick {
        header.push(format!("Ball {i}"));
    }
    if shape.has_special() {
        header.push("Bonus".to_string());
    }

    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        let mut fields: Vec<String> = vec![row.date.format("%Y-%m-%d").to_string()];
        fields.extend(row.values.iter().map(|v| v.to_string()));
        if shape.has_special() {
            fields.push(row.special.map(|s| s.to_string()).unwrap_or_default());
        }
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
