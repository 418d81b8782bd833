#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rate join: attaches encounters-per-100k to each municipality.
//!
//! Municipalities are matched against service and population rows by
//! normalized name only (uppercase + trim, see [`normalize_name`]). There
//! is no fuzzy matching; a name that fails to match yields a rate of 0.
//! When several rows share a normalized name, the first in input order is
//! used and the collision is counted in the [`JoinReport`].

pub mod year;

use std::collections::BTreeMap;

use caps_map_municipality_models::{
    Municipality, PopulationRecord, PopulationTable, RATE_PER, RateStatus, ServiceRecord,
    ServiceTable, StateCode,
};
use serde::Serialize;
use thiserror::Error;

pub use caps_map_municipality_models::normalize_name;
pub use year::closest_year;

/// Errors that abort a join.
#[derive(Debug, Error)]
pub enum JoinError {
    /// The service table has no column for the requested year.
    #[error("Service table has no column for year {year} (available: {available:?})")]
    MissingYearColumn {
        /// The requested year.
        year: i32,
        /// Year columns the table does have.
        available: Vec<i32>,
    },
}

/// Diagnostics from one join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReport {
    /// Requested service year.
    pub year: i32,
    /// Population snapshot actually used, if any was available.
    pub population_year: Option<i32>,
    /// Municipalities with a computed rate.
    pub matched: usize,
    /// Municipalities with no service row.
    pub no_service_match: usize,
    /// Municipalities whose service row is empty for `year`.
    pub no_service_value: usize,
    /// Municipalities with no population row.
    pub no_population_match: usize,
    /// Municipalities whose population is missing or zero.
    pub zero_population: usize,
    /// Normalized service names shared by more than one row.
    pub ambiguous_service_names: usize,
    /// Normalized population names shared by more than one row.
    pub ambiguous_population_names: usize,
}

/// Joins `municipalities` against the service table and the population
/// snapshot nearest to `year`, setting `rate` and `rate_status` in place.
///
/// Service rows only match municipalities of the same state. Population
/// rows carry no state, so the population index is national: a name shared
/// by municipalities in different states resolves to its first row.
///
/// The rate is `round(count / population * 100_000)` with halves rounded to
/// even (`2.5` becomes `2`); every other outcome sets it to `0.0` and
/// records why in `rate_status`.
///
/// # Errors
///
/// Returns [`JoinError::MissingYearColumn`] if the service table has no
/// column for `year`. Municipalities are left untouched in that case.
pub fn join(
    municipalities: &mut [Municipality],
    services: &ServiceTable,
    populations: &[PopulationTable],
    year: i32,
) -> Result<JoinReport, JoinError> {
    if !services.has_year(year) {
        return Err(JoinError::MissingYearColumn {
            year,
            available: services.years.iter().copied().collect(),
        });
    }

    let mut report = JoinReport {
        year,
        ..JoinReport::default()
    };

    let (service_index, ambiguous_services) = index_services(&services.records);
    report.ambiguous_service_names = ambiguous_services;

    let snapshot_years: Vec<i32> = populations.iter().map(|p| p.year).collect();
    let snapshot = closest_year(year, &snapshot_years)
        .and_then(|resolved| populations.iter().find(|p| p.year == resolved));

    let (population_index, ambiguous_populations) =
        snapshot.map_or_else(|| (BTreeMap::new(), 0), |p| index_populations(&p.records));
    report.population_year = snapshot.map(|p| p.year);
    report.ambiguous_population_names = ambiguous_populations;

    if snapshot.is_none() {
        log::warn!("No population snapshot available for {year}; every rate will be 0");
    }

    for municipality in municipalities.iter_mut() {
        let key = (municipality.state_code, municipality.normalized_name.clone());
        let service = service_index.get(&key);
        let population = population_index.get(municipality.normalized_name.as_str());

        let (rate, status) = compute_rate(service.copied(), population.copied(), year);
        municipality.rate = rate;
        municipality.rate_status = status;

        match status {
            RateStatus::Matched => report.matched += 1,
            RateStatus::NoServiceMatch => report.no_service_match += 1,
            RateStatus::NoServiceValue => report.no_service_value += 1,
            RateStatus::NoPopulationMatch => report.no_population_match += 1,
            RateStatus::ZeroPopulation => report.zero_population += 1,
            RateStatus::Pending => {}
        }
    }

    log::info!(
        "Joined {} municipalities for {year}: {} matched, {} without service, {} without population ({} ambiguous service names, {} ambiguous population names)",
        municipalities.len(),
        report.matched,
        report.no_service_match + report.no_service_value,
        report.no_population_match + report.zero_population,
        report.ambiguous_service_names,
        report.ambiguous_population_names,
    );

    Ok(report)
}

fn compute_rate(
    service: Option<&ServiceRecord>,
    population: Option<&PopulationRecord>,
    year: i32,
) -> (f64, RateStatus) {
    let Some(service) = service else {
        return (0.0, RateStatus::NoServiceMatch);
    };
    let Some(&count) = service.counts.get(&year) else {
        return (0.0, RateStatus::NoServiceValue);
    };
    let Some(population) = population else {
        return (0.0, RateStatus::NoPopulationMatch);
    };

    match population.population {
        Some(residents) if residents > 0 => {
            #[allow(clippy::cast_precision_loss)]
            let residents = residents as f64;
            ((count / residents * RATE_PER).round_ties_even(), RateStatus::Matched)
        }
        _ => (0.0, RateStatus::ZeroPopulation),
    }
}

/// Indexes service rows by (state, normalized name), first row wins.
///
/// Rows whose state code is not a known unit are skipped. Returns the
/// index and the number of keys that had more than one row.
fn index_services(records: &[ServiceRecord]) -> (BTreeMap<(StateCode, String), &ServiceRecord>, usize) {
    let mut index = BTreeMap::new();
    let mut collisions: BTreeMap<(StateCode, String), usize> = BTreeMap::new();
    let mut unknown_state = 0usize;

    for record in records {
        let Some(state) = StateCode::parse(&record.state_code) else {
            unknown_state += 1;
            continue;
        };
        let key = (state, normalize_name(&record.municipality_name));
        if index.contains_key(&key) {
            *collisions.entry(key).or_default() += 1;
        } else {
            index.insert(key, record);
        }
    }

    if unknown_state > 0 {
        log::warn!("Skipped {unknown_state} service rows with an unrecognized state code");
    }
    for ((state, name), extra) in &collisions {
        log::debug!("{state}: service name {name:?} has {extra} duplicate row(s); using the first");
    }

    (index, collisions.len())
}

/// Indexes population rows by normalized name, first row wins. There is
/// no state in the key.
fn index_populations(records: &[PopulationRecord]) -> (BTreeMap<String, &PopulationRecord>, usize) {
    let mut index = BTreeMap::new();
    let mut collisions: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        let key = normalize_name(&record.city_name);
        if index.contains_key(&key) {
            *collisions.entry(key).or_default() += 1;
        } else {
            index.insert(key, record);
        }
    }

    for (name, extra) in &collisions {
        log::debug!("Population name {name:?} has {extra} duplicate row(s); using the first");
    }

    (index, collisions.len())
}
