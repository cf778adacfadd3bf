//! CSV loading and best-effort coercion of the raw CTTU export.
//!
//! The export is semicolon-delimited and messy: the date column appears
//! as `DATA` with a lowercase `data` sibling that fills gaps in some
//! yearly files, numeric columns carry blanks and stray decimals, and
//! exact duplicate rows occur across file merges. Rows that cannot
//! yield a date or a street address are dropped and counted.

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Timelike};
use csv::StringRecord;
use via_segura_models::{VehicleCategory, VehicleCounts, VictimCounts};

use crate::IngestError;

/// Date formats observed across the yearly export files.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%d %H:%M:%S"];

/// Time-of-day formats for the `hora` column.
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// One raw export row after coercion, before geocoding.
#[derive(Debug)]
pub(crate) struct RawRow {
    pub date: NaiveDate,
    pub hour: Option<u32>,
    pub endereco: String,
    pub numero: String,
    pub bairro: String,
    pub vehicles: VehicleCounts,
    pub victims: VictimCounts,
}

/// Row-level accounting for the load step.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadStats {
    /// Rows read from the CSV, header excluded.
    pub total_rows: usize,
    /// Rows dropped for a missing or unparsable date.
    pub dropped_no_date: usize,
    /// Rows dropped for a missing street address.
    pub dropped_no_address: usize,
    /// Exact duplicate rows removed.
    pub duplicates_removed: usize,
}

/// Header positions resolved once per file.
struct Columns {
    date: usize,
    date_fallback: Option<usize>,
    hora: Option<usize>,
    endereco: usize,
    numero: Option<usize>,
    bairro: Option<usize>,
    vehicles: Vec<(VehicleCategory, usize)>,
    vitimas: Option<usize>,
    vitimasfatais: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let date = find("DATA")
            .or_else(|| find("Data"))
            .ok_or(IngestError::MissingColumn { name: "DATA" })?;
        let endereco = find("endereco").ok_or(IngestError::MissingColumn { name: "endereco" })?;

        let vehicles = VehicleCategory::all()
            .iter()
            .filter_map(|&cat| find(cat.as_ref()).map(|idx| (cat, idx)))
            .collect();

        Ok(Self {
            date,
            date_fallback: find("data"),
            hora: find("hora"),
            endereco,
            numero: find("numero"),
            bairro: find("bairro"),
            vehicles,
            vitimas: find("vitimas"),
            vitimasfatais: find("vitimasfatais"),
        })
    }
}

/// Reads and coerces all rows from the raw export.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a record cannot be
/// read, or the required `DATA`/`endereco` columns are missing.
pub(crate) fn read_raw_rows(path: &Path) -> Result<(Vec<RawRow>, LoadStats), IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;

    let columns = Columns::resolve(reader.headers()?)?;

    let mut rows = Vec::new();
    let mut stats = LoadStats::default();
    let mut seen = HashSet::new();

    for record in reader.records() {
        let record = record?;
        stats.total_rows += 1;

        if !seen.insert(record.iter().collect::<Vec<_>>().join(";")) {
            stats.duplicates_removed += 1;
            continue;
        }

        let Some(date) = parse_date(&record, &columns) else {
            stats.dropped_no_date += 1;
            continue;
        };

        let endereco = field(&record, Some(columns.endereco));
        if endereco.trim().is_empty() {
            stats.dropped_no_address += 1;
            continue;
        }

        let mut vehicles = VehicleCounts::default();
        for &(cat, idx) in &columns.vehicles {
            let count = parse_count(field(&record, Some(idx)));
            match cat {
                VehicleCategory::Auto => vehicles.auto = count,
                VehicleCategory::Moto => vehicles.moto = count,
                VehicleCategory::Ciclom => vehicles.ciclom = count,
                VehicleCategory::Ciclista => vehicles.ciclista = count,
                VehicleCategory::Pedestre => vehicles.pedestre = count,
                VehicleCategory::Onibus => vehicles.onibus = count,
                VehicleCategory::Caminhao => vehicles.caminhao = count,
                VehicleCategory::Viatura => vehicles.viatura = count,
                VehicleCategory::Outros => vehicles.outros = count,
            }
        }

        rows.push(RawRow {
            date,
            hour: parse_hour(field(&record, columns.hora)),
            endereco: endereco.to_string(),
            numero: field(&record, columns.numero).to_string(),
            bairro: field(&record, columns.bairro).to_string(),
            vehicles,
            victims: VictimCounts {
                vitimas: parse_count(field(&record, columns.vitimas)),
                vitimasfatais: parse_count(field(&record, columns.vitimasfatais)),
            },
        });
    }

    Ok((rows, stats))
}

fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn parse_date(record: &StringRecord, columns: &Columns) -> Option<NaiveDate> {
    let primary = field(record, Some(columns.date)).trim();
    let raw = if primary.is_empty() {
        field(record, columns.date_fallback).trim()
    } else {
        primary
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_hour(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .map(|t| t.hour())
}

/// Coerces a raw numeric field to a count; anything unparsable is 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.parse::<u32>().unwrap_or_else(|_| {
        trimmed
            .parse::<f64>()
            .map(|v| if v.is_finite() && v > 0.0 { v as u32 } else { 0 })
            .unwrap_or(0)
    })
}
