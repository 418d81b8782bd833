//! CSV file repository.
//!
//! Layout under the data root:
//!
//! * `services/{UF}.csv`
//! * `population/{YEAR}.csv`
//! * `facilities/{UF}.csv`

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use caps_map_municipality_models::config::CapsMapConfig;
use caps_map_municipality_models::{FacilityPoint, PopulationTable, ServiceTable, StateCode};

use crate::parsing::{parse_facilities, parse_population_table, parse_service_table};
use crate::{TableError, TableKind, TableRepository};

/// Reads tables from CSV files under a data root.
#[derive(Debug, Clone)]
pub struct CsvFileRepository {
    root: PathBuf,
    config: CapsMapConfig,
}

impl CsvFileRepository {
    /// Creates a repository using `config.data.root` and the table layouts
    /// in `config`.
    #[must_use]
    pub fn new(config: CapsMapConfig) -> Self {
        Self {
            root: config.data.root.clone(),
            config,
        }
    }

    /// Path of the file for a table kind and key.
    #[must_use]
    pub fn path_for(&self, kind: TableKind, key: &str) -> PathBuf {
        let dir = match kind {
            TableKind::Service => "services",
            TableKind::Population => "population",
            TableKind::Facility => "facilities",
        };
        self.root.join(dir).join(format!("{key}.csv"))
    }

    fn open(&self, kind: TableKind, key: &str) -> Result<BufReader<File>, TableError> {
        let path = self.path_for(kind, key);
        if !path.is_file() {
            return Err(TableError::NotFound {
                kind,
                key: key.to_string(),
            });
        }
        log::debug!("Reading {kind} table from {}", path.display());
        Ok(BufReader::new(File::open(&path)?))
    }

    /// The data root this repository reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TableRepository for CsvFileRepository {
    fn service_table(&self, state: StateCode) -> Result<ServiceTable, TableError> {
        let reader = self.open(TableKind::Service, state.as_ref())?;
        let table = parse_service_table(reader, &self.config.services)?;
        log::info!("{state}: loaded {} service rows", table.records.len());
        Ok(table)
    }

    fn population_table(&self, year: i32) -> Result<PopulationTable, TableError> {
        let reader = self.open(TableKind::Population, &year.to_string())?;
        let table = parse_population_table(reader, year, &self.config.population)?;
        log::info!("Loaded {} population rows for {year}", table.records.len());
        Ok(table)
    }

    fn facilities(&self, state: StateCode) -> Result<Vec<FacilityPoint>, TableError> {
        let reader = self.open(TableKind::Facility, state.as_ref())?;
        let points = parse_facilities(reader, &self.config.facilities)?;
        log::info!("{state}: loaded {} facilities", points.len());
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> CsvFileRepository {
        let mut config = CapsMapConfig::default();
        config.data.root = PathBuf::from("/nonexistent/caps-map-data");
        CsvFileRepository::new(config)
    }

    #[test]
    fn resolves_paths_by_kind() {
        let repo = repository();
        assert!(
            repo.path_for(TableKind::Service, "SP")
                .ends_with("services/SP.csv")
        );
        assert!(
            repo.path_for(TableKind::Population, "2022")
                .ends_with("population/2022.csv")
        );
        assert!(
            repo.path_for(TableKind::Facility, "RJ")
                .ends_with("facilities/RJ.csv")
        );
    }

    #[test]
    fn absent_files_are_not_found() {
        let repo = repository();
        assert!(matches!(
            repo.service_table(StateCode::Sp),
            Err(TableError::NotFound { kind: TableKind::Service, ref key }) if key == "SP"
        ));
        assert!(matches!(
            repo.population_table(2016),
            Err(TableError::NotFound { kind: TableKind::Population, ref key }) if key == "2016"
        ));
        assert!(repo.facilities(StateCode::Rj).unwrap_err().is_not_found());
    }
}
