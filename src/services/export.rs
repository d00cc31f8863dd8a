use crate::cli::ExportFormat;
use crate::domain::constants::{
    DAY_NAMES, EXPORT_COLUMN_WIDTHS, EXPORT_HEADER, EXPORT_SHEET_NAME,
};
use crate::domain::models::{Session, State, Visit};
use crate::services::schedule::DateRange;
use crate::services::visits::list_visits;
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

pub type ExportRow = [String; 6];

pub fn day_name(date: NaiveDate) -> &'static str {
    DAY_NAMES[date.weekday().num_days_from_sunday() as usize]
}

/// `DD.MM.YYYY`
pub fn format_date_ro(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Activity names joined with `, `, plus the free-text activity when present.
/// Ids that no longer resolve are skipped.
pub fn activity_text(state: &State, v: &Visit) -> String {
    let mut parts: Vec<&str> = v
        .activity_ids
        .iter()
        .filter_map(|id| state.activities.iter().find(|a| &a.id == id))
        .map(|a| a.name.as_str())
        .collect();
    let other = v.other_activity.trim();
    if !other.is_empty() {
        parts.push(other);
    }
    parts.join(", ")
}

pub fn export_file_name(range: Option<&DateRange>, format: ExportFormat) -> String {
    let (from, to) = match range {
        Some(r) => (r.start().to_string(), r.end().to_string()),
        None => ("ALL".to_string(), "ALL".to_string()),
    };
    format!("planificare_{}_-{}.{}", from, to, format.extension())
}

/// Rows for the visits the session may see, ordered by date.
pub fn export_rows(
    session: &Session,
    state: &State,
    range: Option<&DateRange>,
    agent_filter: Option<&str>,
) -> Vec<ExportRow> {
    let mut visits = list_visits(session, state, range, agent_filter);
    visits.sort_by_key(|v| v.date);
    visits
        .into_iter()
        .map(|v| {
            [
                day_name(v.date).to_string(),
                format_date_ro(v.date),
                state
                    .client(&v.client_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                activity_text(state, v),
                v.details.clone(),
                v.obs.clone(),
            ]
        })
        .collect()
}

pub fn write_xlsx(path: &Path, rows: &[ExportRow]) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, title) in EXPORT_HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (i, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string(i as u32 + 1, col as u16, value.as_str())?;
        }
    }
    for (col, width) in EXPORT_COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    workbook.save(path)?;
    Ok(())
}

pub fn write_csv(path: &Path, rows: &[ExportRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(EXPORT_HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_export(path: &Path, format: ExportFormat, rows: &[ExportRow]) -> anyhow::Result<()> {
    log::debug!("writing {} rows to {}", rows.len(), path.display());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match format {
        ExportFormat::Xlsx => write_xlsx(path, rows),
        ExportFormat::Csv => write_csv(path, rows),
    }
}
