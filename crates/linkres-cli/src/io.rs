//! Reading reference catalogs, source inputs, synonym tables, and sidecar
//! files off disk, and writing `Match`es back out, per the column layouts
//! of §6.

use crate::error::{CliError, Result};
use linkres_core::model::RelationshipKind;
use linkres_core::{Match, ReferenceCatalog, SourceItem, VariantMap};
use std::fs::File;
use std::path::Path;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| CliError::Input {
        path: path.display().to_string(),
        source,
    })
}

fn row_err(path: &Path, source: csv::Error) -> CliError {
    CliError::Csv {
        path: path.display().to_string(),
        source,
    }
}

/// Pick `,` for anything not ending in `.tsv`, tab otherwise.
fn delimiter_for(path: &Path) -> u8 {
    if path.extension().is_some_and(|e| e == "tsv") {
        b'\t'
    } else {
        b','
    }
}

/// Load the reference catalog file: one entry per record, pipe-separated,
/// column 1 the main label and columns 2.. aliases.
pub fn load_catalog(path: &Path) -> Result<ReferenceCatalog> {
    Ok(ReferenceCatalog::from_rows(load_catalog_rows(path)?)?)
}

/// Raw pipe-separated catalog rows, without building a `ReferenceCatalog` —
/// used by the ambiguous-alias data-quality commands, which need to inspect
/// aliases across rows before any are dropped.
pub fn load_catalog_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .from_reader(open(path)?);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| row_err(path, e))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(rows)
}

/// Write pipe-separated catalog rows back out, e.g. after stripping
/// ambiguous aliases.
pub fn write_catalog_rows(path: Option<&Path>, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'|')
        .from_writer(new_sink(path)?);
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| CliError::Runtime(e.to_string()))?;
    }
    writer.flush().map_err(|source| CliError::Input {
        path: path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdout>".into()),
        source,
    })
}

/// Load a two-column `(grid_id, alias)` sidecar.
pub fn load_alias_sidecar(path: &Path) -> Result<Vec<(String, String)>> {
    read_csv_rows(path)?
        .into_iter()
        .map(|r| tuple2(path, r))
        .collect()
}

/// Load a three-column `(grid_id, iso639, label)` sidecar.
pub fn load_translation_sidecar(path: &Path) -> Result<Vec<(String, String, String)>> {
    read_csv_rows(path)?
        .into_iter()
        .map(|r| tuple3(path, r))
        .collect()
}

/// Load a three-column `(grid_id, related_grid_id, relationship_type)`
/// sidecar; `relationship_type` is `Parent` or `Child`, case-insensitively.
pub fn load_relationship_sidecar(path: &Path) -> Result<Vec<(String, String, RelationshipKind)>> {
    read_csv_rows(path)?
        .into_iter()
        .map(|r| {
            let (grid_id, related, kind) = tuple3(path, r)?;
            let kind = match kind.to_lowercase().as_str() {
                "parent" => RelationshipKind::Parent,
                "child" => RelationshipKind::Child,
                other => {
                    return Err(CliError::Runtime(format!(
                        "unknown relationship type {other:?} in {}",
                        path.display()
                    )));
                }
            };
            Ok((grid_id, related, kind))
        })
        .collect()
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(open(path)?);
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| row_err(path, e))?;
        out.push(record.iter().map(str::to_string).collect());
    }
    Ok(out)
}

fn tuple2(path: &Path, mut row: Vec<String>) -> Result<(String, String)> {
    if row.len() < 2 {
        return Err(CliError::Runtime(format!(
            "expected 2 columns in {}, got {}",
            path.display(),
            row.len()
        )));
    }
    let b = row.remove(1);
    let a = row.remove(0);
    Ok((a, b))
}

fn tuple3(path: &Path, mut row: Vec<String>) -> Result<(String, String, String)> {
    if row.len() < 3 {
        return Err(CliError::Runtime(format!(
            "expected 3 columns in {}, got {}",
            path.display(),
            row.len()
        )));
    }
    let c = row.remove(2);
    let b = row.remove(1);
    let a = row.remove(0);
    Ok((a, b, c))
}

/// Load the synonym file: pipe-separated, column 1 canonical form, column
/// 2 alternative.
pub fn load_synonyms(path: &Path) -> Result<VariantMap> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .from_reader(open(path)?);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| row_err(path, e))?;
        let (main, alt) = tuple2(path, record.iter().map(str::to_string).collect())?;
        rows.push((main, alt));
    }
    Ok(VariantMap::from_rows(rows))
}

/// Load source items from a CSV/TSV file with a header row. Recognized
/// columns (case-insensitive): `doc_id`, `label` (required), `parent_label`,
/// `country`, `city`, `acronym`. A row that fails to decode is logged at
/// ERROR and skipped, per §7.
pub fn load_source_items(path: &Path) -> Result<Vec<SourceItem>> {
    let delimiter = delimiter_for(path);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(open(path)?);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| row_err(path, e))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let label_col = col("label").ok_or_else(|| {
        CliError::Runtime(format!(
            "{}: missing required 'label' column",
            path.display()
        ))
    })?;
    let doc_id_col = col("doc_id");
    let parent_label_col = col("parent_label");
    let country_col = col("country");
    let city_col = col("city");
    let acronym_col = col("acronym");

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(row = i, error = %e, "skipping undecodable input row");
                continue;
            }
        };
        let Some(label) = record.get(label_col) else {
            tracing::error!(row = i, "skipping row with no label column value");
            continue;
        };
        let doc_id = doc_id_col
            .and_then(|c| record.get(c))
            .map(str::to_string)
            .unwrap_or_else(|| i.to_string());
        let mut item = SourceItem::new(doc_id, label);
        item.parent_label = parent_label_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        item.country = country_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        item.city = city_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        item.acronym = acronym_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        out.push(item);
    }
    Ok(out)
}

/// Write matches (including unmatched rows as empty canonical fields) in
/// the fixed column order of §6.
pub fn write_matches(
    path: Option<&Path>,
    items: &[SourceItem],
    matches: &[Option<Match>],
) -> Result<()> {
    let mut writer = new_writer(path)?;
    writer
        .write_record([
            "doc_id",
            "label",
            "canonical_id",
            "parent_canonical_id",
            "canonical_label",
            "reason",
            "city",
            "country",
        ])
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    for (item, m) in items.iter().zip(matches) {
        let row: [String; 8] = match m {
            Some(m) => [
                m.doc_id.clone(),
                m.label.clone(),
                m.canonical_id.0.to_string(),
                m.parent_canonical_id
                    .map(|id| id.0.to_string())
                    .unwrap_or_default(),
                m.canonical_label.clone(),
                m.reason.clone(),
                m.city.clone().unwrap_or_default(),
                m.country.clone().unwrap_or_default(),
            ],
            None => [
                item.doc_id.clone(),
                item.label.clone(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                item.city.clone().unwrap_or_default(),
                item.country.clone().unwrap_or_default(),
            ],
        };
        writer
            .write_record(&row)
            .map_err(|e| CliError::Runtime(e.to_string()))?;
    }
    writer.flush().map_err(|source| CliError::Input {
        path: path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdout>".into()),
        source,
    })
}

fn new_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn std::io::Write>>> {
    Ok(csv::Writer::from_writer(new_sink(path)?))
}

fn new_sink(path: Option<&Path>) -> Result<Box<dyn std::io::Write>> {
    match path {
        Some(p) => Ok(Box::new(File::create(p).map_err(|source| {
            CliError::Input {
                path: p.display().to_string(),
                source,
            }
        })?)),
        None => Ok(Box::new(std::io::stdout())),
    }
}
