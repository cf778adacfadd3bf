#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for turning the raw CTTU accident export into
//! [`AccidentEvent`] records.
//!
//! The pipeline: CSV load with best-effort coercion, address cleaning,
//! geocode-cache lookup, seeded coordinate jitter for number-less
//! addresses, H3 cell assignment, and calendar flagging. Everything is
//! offline and deterministic for a fixed input and seed.

pub mod address;
pub mod geocode;
mod loader;
pub mod spatial;

use std::path::Path;

use chrono::Datelike as _;
use thiserror::Error;
use via_segura_models::{AccidentEvent, UNKNOWN_CATEGORY};
use via_segura_temporal::{HolidayCalendar, is_weekend};

pub use loader::LoadStats;

/// Error type for the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Filesystem error reading an input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed geocode cache document.
    #[error("geocode cache error: {0}")]
    Cache(#[from] serde_json::Error),

    /// A required column is absent from the export header.
    #[error("missing required column `{name}`")]
    MissingColumn {
        /// Name of the missing column.
        name: &'static str,
    },
}

/// Accounting for one ingestion run.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestSummary {
    /// Row-level load accounting.
    pub load: LoadStats,
    /// Events that resolved coordinates through the geocode cache.
    pub geocoded: usize,
    /// Events whose coordinates received jitter.
    pub jittered: usize,
    /// Events assigned an H3 cell.
    pub cell_assigned: usize,
}

/// Loads, cleans, geocodes, and cell-assigns the raw export.
///
/// `jitter_seed` makes the coordinate jitter reproducible; the same
/// input and seed always yield the same events.
///
/// Events that cannot be geocoded keep `cell = None` and are carried
/// through — the weekly aggregator discards them, but their dates still
/// bound the observed-week axis.
///
/// # Errors
///
/// Returns an error if the CSV or the geocode cache cannot be read or
/// parsed.
pub fn load_events(
    csv_path: &Path,
    geocode_cache_path: &Path,
    jitter_seed: u64,
) -> Result<(Vec<AccidentEvent>, IngestSummary), IngestError> {
    log::info!("Loading raw export from {}", csv_path.display());
    let (rows, load_stats) = loader::read_raw_rows(csv_path)?;
    log::info!(
        "Loaded {} rows ({} no date, {} no address, {} duplicates dropped)",
        rows.len(),
        load_stats.dropped_no_date,
        load_stats.dropped_no_address,
        load_stats.duplicates_removed,
    );

    let cache = geocode::GeocodeCache::load(geocode_cache_path)?;

    let calendar = rows
        .iter()
        .map(|row| row.date.year())
        .fold(Option::<(i32, i32)>::None, |acc, year| match acc {
            None => Some((year, year)),
            Some((lo, hi)) => Some((lo.min(year), hi.max(year))),
        })
        .map_or_else(
            || HolidayCalendar::for_years(1970..=1970),
            |(lo, hi)| HolidayCalendar::for_years(lo..=hi),
        );

    let mut jitter = spatial::Jitter::with_seed(jitter_seed);
    let mut summary = IngestSummary {
        load: load_stats,
        ..IngestSummary::default()
    };

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let endereco_clean = address::clean_address_part(&row.endereco);
        let numero_clean = address::clean_address_part(&row.numero);
        let bairro_clean = address::clean_address_part(&row.bairro);

        let key = address::geocode_key(&endereco_clean, &numero_clean, &bairro_clean);
        let mut coords = cache.lookup(&key);

        if coords.is_some() {
            summary.geocoded += 1;

            // Number-less addresses geocode to street centroids; spread
            // them before cell assignment.
            if numero_clean.is_empty() {
                coords = coords.map(|(lat, lon)| jitter.apply(lat, lon));
                summary.jittered += 1;
            }
        }

        let cell = coords.and_then(|(lat, lon)| spatial::assign_cell(lat, lon));
        if cell.is_some() {
            summary.cell_assigned += 1;
        }

        events.push(AccidentEvent {
            date: row.date,
            hour: row.hour,
            cell,
            latitude: coords.map(|(lat, _)| lat),
            longitude: coords.map(|(_, lon)| lon),
            vehicles: row.vehicles,
            victims: row.victims,
            bairro: if bairro_clean.is_empty() {
                UNKNOWN_CATEGORY.to_string()
            } else {
                bairro_clean
            },
            endereco: endereco_clean,
            holiday: calendar.contains(row.date),
            weekend: is_weekend(row.date),
        });
    }

    log::info!(
        "Ingested {} events ({} geocoded, {} jittered, {} cell-assigned)",
        events.len(),
        summary.geocoded,
        summary.jittered,
        summary.cell_assigned,
    );

    Ok((events, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn end_to_end_load_assigns_cells_and_flags() {
        let csv = write_file(
            "via_segura_ingest_e2e.csv",
            "DATA;hora;endereco;numero;bairro;auto;vitimas\n\
             2024-06-10;08:00:00;rua da aurora;120;boa vista;1;0\n\
             2024-06-16;;av norte;;santo amaro;2;1\n\
             2024-12-25;;rua sem geocode;1;centro;1;0\n",
        );
        let cache = write_file(
            "via_segura_ingest_e2e_cache.json",
            r#"{
              "rua da aurora, 120, boa vista, Recife, Pernambuco, Brasil": [-8.0616, -34.8711],
              "avenida norte, santo amaro, Recife, Pernambuco, Brasil": [-8.0450, -34.8900]
            }"#,
        );

        let (events, summary) = load_events(&csv, &cache, 42).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(summary.geocoded, 2);
        assert_eq!(summary.cell_assigned, 2);
        // Only the number-less address is jittered.
        assert_eq!(summary.jittered, 1);

        // Geocoded events carry a cell; the cache miss does not.
        assert!(events[0].cell.is_some());
        assert!(events[1].cell.is_some());
        assert!(events[2].cell.is_none());

        // Calendar flags: 2024-06-16 is a Sunday, 2024-12-25 is Natal.
        assert!(!events[0].weekend);
        assert!(events[1].weekend);
        assert!(events[2].holiday);

        // The un-jittered event keeps exact cache coordinates.
        assert_eq!(events[0].latitude, Some(-8.0616));

        std::fs::remove_file(csv).ok();
        std::fs::remove_file(cache).ok();
    }

    #[test]
    fn same_seed_reproduces_jittered_coordinates() {
        let csv = write_file(
            "via_segura_ingest_seed.csv",
            "DATA;endereco;numero;bairro;auto\n2024-06-10;av norte;;santo amaro;1\n",
        );
        let cache = write_file(
            "via_segura_ingest_seed_cache.json",
            r#"{"avenida norte, santo amaro, Recife, Pernambuco, Brasil": [-8.0450, -34.8900]}"#,
        );

        let (a, _) = load_events(&csv, &cache, 42).unwrap();
        let (b, _) = load_events(&csv, &cache, 42).unwrap();
        let (c, _) = load_events(&csv, &cache, 1).unwrap();

        assert_eq!(a[0].latitude, b[0].latitude);
        assert_ne!(a[0].latitude, c[0].latitude);

        std::fs::remove_file(csv).ok();
        std::fs::remove_file(cache).ok();
    }
}
