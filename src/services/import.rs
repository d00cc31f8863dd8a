use crate::domain::constants::{ADDRESS_COLUMNS, COUNTY_COLUMNS, NAME_COLUMNS, PHONE_COLUMNS};
use crate::domain::models::{ImportReport, Session, State};
use crate::error::validation;
use crate::services::policy::{can_import_clients, require};
use crate::services::roster::new_client;
use crate::services::settings::DefaultSettings;
use anyhow::Context;
use calamine::{open_workbook_auto, Reader};
use std::collections::HashMap;
use std::path::Path;

/// First sheet of a spreadsheet: header row plus data rows as text.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    fn cell(&self, row: &[String], col: Option<usize>) -> String {
        col.and_then(|i| row.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

fn normalize_header(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Column matching the first candidate that equals, or is contained in, a header.
pub fn find_key(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    candidates.iter().find_map(|c| {
        let c = normalize_header(c);
        normalized
            .iter()
            .position(|h| *h == c || h.contains(&c))
    })
}

fn read_csv(path: &Path) -> anyhow::Result<SheetTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    let sheet = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(SheetTable {
        sheet,
        headers,
        rows,
    })
}

fn read_workbook(path: &Path, requested: Option<&str>) -> anyhow::Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let names = workbook.sheet_names();
    let sheet = match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(r) if names.iter().any(|n| n == r) => r.to_string(),
        Some(r) => {
            log::warn!("sheet {} not found, using the first sheet", r);
            names.first().cloned().unwrap_or_default()
        }
        None => names.first().cloned().unwrap_or_default(),
    };
    if sheet.is_empty() {
        return Err(validation("workbook has no sheets"));
    }
    let range = workbook.worksheet_range(&sheet)?;
    let mut iter = range.rows();
    let headers = match iter.next() {
        Some(row) => row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => Vec::new(),
    };
    let rows = iter
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();
    Ok(SheetTable {
        sheet,
        headers,
        rows,
    })
}

/// Reads `.csv` with the csv reader and any other extension as a workbook.
pub fn read_table(path: &Path, sheet: Option<&str>) -> anyhow::Result<SheetTable> {
    let is_csv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        read_csv(path)
    } else {
        read_workbook(path, sheet)
    }
}

fn dedupe_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Merges sheet rows into the client roster. Matches on name and county, then name alone;
/// matched clients only get their empty fields filled.
pub fn merge_clients(
    state: &mut State,
    defaults: &DefaultSettings,
    table: &SheetTable,
) -> anyhow::Result<ImportReport> {
    if table.rows.is_empty() {
        return Err(validation(format!("sheet {} appears empty", table.sheet)));
    }
    let name_col = find_key(&table.headers, &NAME_COLUMNS).ok_or_else(|| {
        validation("no client name column found (use Client, Nume or Nume client)")
    })?;
    let county_col = find_key(&table.headers, &COUNTY_COLUMNS);
    let address_col = find_key(&table.headers, &ADDRESS_COLUMNS);
    let phone_col = find_key(&table.headers, &PHONE_COLUMNS);

    let mut by_name_county: HashMap<String, usize> = HashMap::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (i, c) in state.clients.iter().enumerate() {
        let nk = dedupe_key(&c.name);
        if !nk.is_empty() {
            by_name_county.insert(format!("{}|{}", nk, dedupe_key(&c.county)), i);
            by_name.insert(nk, i);
        }
    }

    let (mut added, mut updated) = (0, 0);
    for row in &table.rows {
        let name = table.cell(row, Some(name_col));
        if name.is_empty() {
            continue;
        }
        let county = table.cell(row, county_col);
        let address = table.cell(row, address_col);
        let phone = table.cell(row, phone_col);
        let nk = dedupe_key(&name);

        let existing = by_name_county
            .get(&format!("{}|{}", nk, dedupe_key(&county)))
            .or_else(|| by_name.get(&nk))
            .copied();
        match existing {
            Some(i) => {
                let c = &mut state.clients[i];
                for (field, value) in [
                    (&mut c.county, &county),
                    (&mut c.address, &address),
                    (&mut c.phone, &phone),
                ] {
                    if field.is_empty() && !value.is_empty() {
                        *field = value.clone();
                    }
                }
                by_name_county.insert(format!("{}|{}", nk, dedupe_key(&c.county)), i);
                by_name.insert(nk, i);
                updated += 1;
            }
            None => {
                let i = state.clients.len();
                state
                    .clients
                    .push(new_client(defaults, &name, &county, &address, &phone));
                by_name_county.insert(format!("{}|{}", nk, dedupe_key(&county)), i);
                by_name.insert(nk, i);
                added += 1;
            }
        }
    }

    log::info!(
        "imported sheet {}: {} added, {} updated",
        table.sheet,
        added,
        updated
    );
    Ok(ImportReport {
        sheet: table.sheet.clone(),
        added,
        updated,
    })
}

pub fn import_clients(
    session: &Session,
    state: &mut State,
    defaults: &DefaultSettings,
    path: &Path,
    sheet: Option<&str>,
) -> anyhow::Result<ImportReport> {
    require(
        can_import_clients(session),
        "only administrators can import clients",
    )?;
    let table = read_table(path, sheet)?;
    merge_clients(state, defaults, &table)
}
