//! Stop-name catalog read from GTFS static `stops.txt`.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Stations of the G, A and C lines, used when no `stops.txt` is configured.
const EMBEDDED_STOPS: &str = include_str!("../data/stops.txt");

#[derive(Debug, Deserialize)]
struct StopRow {
    stop_id: String,
    stop_name: String,
    parent_station: Option<String>,
}

/// Maps stop ids to human-readable station names.
#[derive(Debug, Default, Clone)]
pub struct StopCatalog {
    names: HashMap<String, String>,
    parents: HashMap<String, String>,
}

impl StopCatalog {
    /// Parses a GTFS `stops.txt`. Columns other than `stop_id`, `stop_name`
    /// and `parent_station` are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut catalog = StopCatalog::default();

        for result in rdr.deserialize() {
            let row: StopRow = result?;
            if let Some(parent) = row.parent_station.filter(|p| !p.is_empty()) {
                catalog.parents.insert(row.stop_id.clone(), parent);
            }
            catalog.names.insert(row.stop_id, row.stop_name);
        }

        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let catalog = Self::from_reader(file)?;
        debug!(path = %path.display(), stops = catalog.len(), "Loaded stop catalog");
        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_reader(EMBEDDED_STOPS.as_bytes())
    }

    /// Loads `path` when given, the embedded catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolves a stop id to its name.
    ///
    /// Platform ids fall back to their parent station: first through the
    /// `parent_station` column, then by dropping a trailing `N`/`S`
    /// (`G35S` → `G35`).
    pub fn name(&self, stop_id: &str) -> Option<&str> {
        if let Some(name) = self.names.get(stop_id) {
            return Some(name);
        }

        if let Some(name) = self
            .parents
            .get(stop_id)
            .and_then(|parent| self.names.get(parent))
        {
            return Some(name);
        }

        stop_id
            .strip_suffix(['N', 'S'])
            .and_then(|parent| self.names.get(parent))
            .map(String::as_str)
    }

    /// Like [`StopCatalog::name`] but returns the id itself for unknown stops.
    pub fn name_or_id<'a>(&'a self, stop_id: &'a str) -> &'a str {
        self.name(stop_id).unwrap_or(stop_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_has_commute_stations() {
        let catalog = StopCatalog::embedded().unwrap();

        assert!(!catalog.is_empty());
        assert_eq!(catalog.name("G35"), Some("Clinton-Washington Avs"));
        assert_eq!(catalog.name("A42"), Some("Hoyt-Schermerhorn Sts"));
        assert_eq!(catalog.name("A36"), Some("Chambers St"));
        assert_eq!(catalog.name("F27"), Some("Church Av"));
    }

    #[test]
    fn test_platform_ids_fall_back_to_parent() {
        let catalog = StopCatalog::embedded().unwrap();

        assert_eq!(catalog.name("G35S"), Some("Clinton-Washington Avs"));
        assert_eq!(catalog.name("A42N"), Some("Hoyt-Schermerhorn Sts"));
    }

    #[test]
    fn test_parent_station_column_is_used() {
        let csv = "stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station\n\
                   101,Van Cortlandt Park-242 St,40.889248,-73.898583,1,\n\
                   101X,Van Cortlandt Park-242 St (platform),40.889248,-73.898583,0,101\n";
        let catalog = StopCatalog::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name("101"), Some("Van Cortlandt Park-242 St"));
        assert_eq!(
            catalog.name("101X"),
            Some("Van Cortlandt Park-242 St (platform)")
        );
        assert_eq!(catalog.name("101N"), Some("Van Cortlandt Park-242 St"));
    }

    #[test]
    fn test_unknown_stop_returns_id() {
        let catalog = StopCatalog::embedded().unwrap();

        assert_eq!(catalog.name("Z99N"), None);
        assert_eq!(catalog.name_or_id("Z99N"), "Z99N");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = StopCatalog::from_path(Path::new("/nonexistent/stops.txt"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
