#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular source loading: service counts per state, population snapshots
//! per year, and facility overlay points per state.
//!
//! Tables are read through the [`TableRepository`] trait so the render
//! pipeline can be driven from files ([`file::CsvFileRepository`]) or from
//! memory in tests.

pub mod file;
pub mod parsing;

use caps_map_municipality_models::{FacilityPoint, PopulationTable, ServiceTable, StateCode};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Which table a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TableKind {
    /// Per-state service encounter counts.
    Service,
    /// Per-year population snapshot.
    Population,
    /// Per-state facility locations.
    Facility,
}

/// Errors that can occur while loading a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// No file exists for the requested key.
    #[error("No {kind} table found for {key}")]
    NotFound {
        /// Table kind.
        kind: TableKind,
        /// State code or year.
        key: String,
    },

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV is malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configured column is missing from the header.
    #[error("{kind} table has no column named {column:?}")]
    MissingColumn {
        /// Table kind.
        kind: TableKind,
        /// Expected column name.
        column: String,
    },

    /// A cell holds a value that cannot be used.
    #[error("Invalid value {value:?} in column {column:?} at line {line}")]
    InvalidValue {
        /// Column name.
        column: String,
        /// 1-based line number in the file.
        line: u64,
        /// Raw cell contents.
        value: String,
    },

    /// The configured delimiter is not a single ASCII character.
    #[error("Delimiter {delimiter:?} is not ASCII")]
    InvalidDelimiter {
        /// The configured delimiter.
        delimiter: char,
    },
}

impl TableError {
    /// Whether this error means "file absent" rather than "file broken".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Tabular file repository.
///
/// Implementations must return [`TableError::NotFound`] when the key has no
/// file, distinct from an empty table.
pub trait TableRepository {
    /// Loads the service table for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the table is absent or unreadable.
    fn service_table(&self, state: StateCode) -> Result<ServiceTable, TableError>;

    /// Loads the population snapshot for `year`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the table is absent or unreadable.
    fn population_table(&self, year: i32) -> Result<PopulationTable, TableError>;

    /// Loads the deduplicated facility points for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the table is absent or unreadable.
    fn facilities(&self, state: StateCode) -> Result<Vec<FacilityPoint>, TableError>;
}

impl<R: TableRepository + ?Sized> TableRepository for &R {
    fn service_table(&self, state: StateCode) -> Result<ServiceTable, TableError> {
        (**self).service_table(state)
    }

    fn population_table(&self, year: i32) -> Result<PopulationTable, TableError> {
        (**self).population_table(year)
    }

    fn facilities(&self, state: StateCode) -> Result<Vec<FacilityPoint>, TableError> {
        (**self).facilities(state)
    }
}

/// Removes duplicate facilities by (name, latitude, longitude), keeping the
/// first occurrence and input order.
#[must_use]
pub fn dedup_facilities(points: Vec<FacilityPoint>) -> Vec<FacilityPoint> {
    let mut seen = std::collections::BTreeSet::new();
    points
        .into_iter()
        .filter(|point| seen.insert(point.dedup_key()))
        .collect()
}
