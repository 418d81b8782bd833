//! CSV parsers for the three table kinds.
//!
//! Parsers take any [`std::io::Read`] so they can be fed from files or
//! byte slices. Column names come from config and are matched against
//! trimmed headers.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use caps_map_municipality_models::config::{
    FacilityTableConfig, PopulationTableConfig, ServiceTableConfig,
};
use caps_map_municipality_models::{
    FacilityPoint, PopulationRecord, PopulationTable, ServiceRecord, ServiceTable,
};

use crate::{TableError, TableKind, dedup_facilities};

/// Header row offset: data row `i` (0-based) sits on line `i + 2`.
const FIRST_DATA_LINE: u64 = 2;

/// Parses a service table.
///
/// Every header that reads as a four-digit year becomes a year column.
/// Empty count cells are left out of the record's `counts`.
///
/// # Errors
///
/// Returns [`TableError::MissingColumn`] if the municipality or state
/// column is absent, [`TableError::InvalidValue`] for a count that is not
/// a finite non-negative number, or [`TableError::Csv`] for malformed CSV.
pub fn parse_service_table<R: Read>(
    reader: R,
    config: &ServiceTableConfig,
) -> Result<ServiceTable, TableError> {
    let mut reader = build_reader(reader, config.delimiter)?;
    let headers = read_headers(&mut reader)?;

    let name_idx = column_index(&headers, &config.municipality_column, TableKind::Service)?;
    let state_idx = column_index(&headers, &config.state_column, TableKind::Service)?;

    let year_columns: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| parse_year_header(header).map(|year| (idx, year)))
        .collect();
    let years: BTreeSet<i32> = year_columns.iter().map(|(_, year)| *year).collect();

    let mut records = Vec::new();
    for (row, result) in (0u64..).zip(reader.records()) {
        let record = result?;
        let line = row + FIRST_DATA_LINE;

        let mut counts = BTreeMap::new();
        for &(idx, year) in &year_columns {
            let cell = record.get(idx).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            let count = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| TableError::InvalidValue {
                    column: headers[idx].clone(),
                    line,
                    value: cell.to_string(),
                })?;
            counts.insert(year, count);
        }

        records.push(ServiceRecord {
            municipality_name: record.get(name_idx).unwrap_or("").to_string(),
            state_code: record.get(state_idx).unwrap_or("").trim().to_string(),
            counts,
        });
    }

    log::debug!(
        "Parsed {} service rows with year columns {:?}",
        records.len(),
        years
    );

    Ok(ServiceTable { years, records })
}

/// Parses a population snapshot for `year`.
///
/// Empty, unparseable, or negative populations become `None`, which the
/// join treats the same as zero.
///
/// # Errors
///
/// Returns [`TableError::MissingColumn`] if the city or population column
/// is absent, or [`TableError::Csv`] for malformed CSV.
pub fn parse_population_table<R: Read>(
    reader: R,
    year: i32,
    config: &PopulationTableConfig,
) -> Result<PopulationTable, TableError> {
    let mut reader = build_reader(reader, config.delimiter)?;
    let headers = read_headers(&mut reader)?;

    let city_idx = column_index(&headers, &config.city_column, TableKind::Population)?;
    let population_idx =
        column_index(&headers, &config.population_column, TableKind::Population)?;

    let mut records = Vec::new();
    for (row, result) in (0u64..).zip(reader.records()) {
        let record = result?;
        let cell = record.get(population_idx).unwrap_or("");
        let population = parse_population(cell);
        if population.is_none() && !cell.trim().is_empty() {
            log::debug!(
                "Population {year} line {}: ignoring value {cell:?}",
                row + FIRST_DATA_LINE
            );
        }

        records.push(PopulationRecord {
            city_name: record.get(city_idx).unwrap_or("").to_string(),
            population,
        });
    }

    Ok(PopulationTable { year, records })
}

/// Parses facility points, skipping rows without usable coordinates and
/// dropping duplicates.
///
/// # Errors
///
/// Returns [`TableError::MissingColumn`] if a configured column is absent,
/// or [`TableError::Csv`] for malformed CSV.
pub fn parse_facilities<R: Read>(
    reader: R,
    config: &FacilityTableConfig,
) -> Result<Vec<FacilityPoint>, TableError> {
    let mut reader = build_reader(reader, config.delimiter)?;
    let headers = read_headers(&mut reader)?;

    let name_idx = column_index(&headers, &config.name_column, TableKind::Facility)?;
    let lat_idx = column_index(&headers, &config.latitude_column, TableKind::Facility)?;
    let lng_idx = column_index(&headers, &config.longitude_column, TableKind::Facility)?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        let Some((latitude, longitude)) = parse_lat_lng(record.get(lat_idx), record.get(lng_idx))
        else {
            skipped += 1;
            continue;
        };

        points.push(FacilityPoint {
            name: record.get(name_idx).unwrap_or("").trim().to_string(),
            latitude,
            longitude,
        });
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} facility rows without valid coordinates");
    }

    Ok(dedup_facilities(points))
}

fn build_reader<R: Read>(reader: R, delimiter: char) -> Result<csv::Reader<R>, TableError> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(TableError::InvalidDelimiter { delimiter })?;

    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader))
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>, TableError> {
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
        .collect())
}

fn column_index(headers: &[String], column: &str, kind: TableKind) -> Result<usize, TableError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| TableError::MissingColumn {
            kind,
            column: column.to_string(),
        })
}

/// Reads a header as a year column (`"2023"`, `"2023.0"`).
fn parse_year_header(header: &str) -> Option<i32> {
    let digits = header.strip_suffix(".0").unwrap_or(header);
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_population(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(value) = cell.parse::<u64>() {
        return Some(value);
    }
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
}

/// Returns `None` if either coordinate is missing, unparseable, or out of
/// range. `NaN` and infinities fall outside every range.
fn parse_lat_lng(lat: Option<&str>, lng: Option<&str>) -> Option<(f64, f64)> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = lng?.trim().parse::<f64>().ok()?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some((latitude, longitude))
}
