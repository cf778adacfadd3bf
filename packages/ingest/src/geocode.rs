//! Geocode cache lookup.
//!
//! The cache is a JSON document mapping a normalized address string to a
//! `[latitude, longitude]` pair, produced by an offline geocoding run.
//! Lookups never hit the network.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::IngestError;

/// In-memory geocode cache keyed by normalized address string.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: BTreeMap<String, (f64, f64)>,
}

impl GeocodeCache {
    /// Loads the cache from a JSON file of `address -> [lat, lon]`.
    ///
    /// Entries whose coordinate array has fewer than two elements are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path)?;
        let raw: BTreeMap<String, Vec<f64>> = serde_json::from_reader(BufReader::new(file))?;

        let entries: BTreeMap<String, (f64, f64)> = raw
            .into_iter()
            .filter_map(|(address, coords)| match coords.as_slice() {
                [lat, lon, ..] => Some((address, (*lat, *lon))),
                _ => None,
            })
            .collect();

        log::info!("Loaded {} geocode cache entries", entries.len());
        Ok(Self { entries })
    }

    /// Looks up coordinates for a normalized address key.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<(f64, f64)> {
        self.entries.get(key).copied()
    }

    /// Number of cached addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn loads_and_looks_up() {
        let dir = std::env::temp_dir();
        let path = dir.join("via_segura_geocode_cache_test.json");
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            r#"{{"rua da aurora, Recife, Pernambuco, Brasil": [-8.057, -34.876], "bad": [1.0]}}"#
        )
        .unwrap();

        let cache = GeocodeCache::load(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.lookup("rua da aurora, Recife, Pernambuco, Brasil"),
            Some((-8.057, -34.876))
        );
        assert_eq!(cache.lookup("missing"), None);

        std::fs::remove_file(path).ok();
    }
}
