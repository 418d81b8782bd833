#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One render cycle of the CAPS choropleth.
//!
//! A [`RenderSession`] owns the memoized repositories, the configuration,
//! and the per-state viewport store. Each call to [`RenderSession::render`]
//! loads the state's geometry, joins the service and population tables for
//! the selected year, builds the color scale, and returns a
//! [`RenderBundle`] ready for the rendering collaborator.
//!
//! Only a failed geometry load is fatal. Missing service, population, or
//! facility files degrade to partial data with a warning.

pub mod cache;
pub mod config;
pub mod progress;
pub mod viewport;

use caps_map_color::style::{Style, StyleFunction};
use caps_map_color::{ColorScale, LegendStop, Palette};
use caps_map_export::{TOOLTIP_FIELDS, export_facilities, export_municipalities};
use caps_map_geometry::{GeometryError, GeometryRepository, GeometrySource};
use caps_map_join::{JoinError, JoinReport, closest_year, join};
use caps_map_municipality_models::config::{CapsMapConfig, StyleConfig};
use caps_map_municipality_models::{
    FacilityPoint, LastActiveView, Municipality, PopulationTable, ServiceTable, StateCode,
    Viewport,
};
use caps_map_tables::{TableError, TableRepository};
use geojson::FeatureCollection;
use serde::Serialize;
use thiserror::Error;

use crate::cache::CachedRepository;
use crate::config::ConfigError;
use crate::progress::ProgressCallback;
use crate::viewport::ViewportStore;

/// Errors that abort a render cycle.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The state code is not one of the 27 federative units.
    #[error("Unknown state code {code:?}")]
    UnknownState {
        /// The rejected input.
        code: String,
    },

    /// The year lies outside the configured range.
    #[error("Year {year} is outside [{min}, {max}]")]
    YearOutOfRange {
        /// The requested year.
        year: i32,
        /// First selectable year.
        min: i32,
        /// Last selectable year.
        max: i32,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Geometry could not be loaded.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// A table exists but could not be read.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The join was aborted.
    #[error(transparent)]
    Join(#[from] JoinError),
}

impl RenderError {
    /// Whether this error means the state has no geometry file.
    #[must_use]
    pub const fn is_missing_geometry(&self) -> bool {
        matches!(self, Self::Geometry(GeometryError::NotFound { .. }))
    }
}

/// Parses a two-letter state code as supplied by the selection UI.
///
/// # Errors
///
/// Returns [`RenderError::UnknownState`] if `code` is not a known state.
pub fn parse_state(code: &str) -> Result<StateCode, RenderError> {
    StateCode::parse(code).ok_or_else(|| RenderError::UnknownState {
        code: code.to_string(),
    })
}

/// Everything the rendering collaborator needs for one state and year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBundle {
    /// Selected state.
    pub state: StateCode,
    /// Selected service year.
    pub year: i32,
    /// Population snapshot used for the rates.
    pub population_year: Option<i32>,
    /// Municipality polygons with `name` and `rate`.
    pub features: FeatureCollection,
    /// Facility markers.
    pub facilities: FeatureCollection,
    /// Color scale over the positive rates.
    pub scale: ColorScale,
    /// Legend stops in raw rate units.
    pub legend: Vec<LegendStop>,
    /// Border and opacity settings shared by every polygon.
    pub style: StyleConfig,
    /// Per-feature styles, parallel to `features`.
    pub styles: Vec<Style>,
    /// Feature properties to show in the tooltip.
    pub tooltip_fields: Vec<String>,
    /// Initial map view.
    pub viewport: Viewport,
    /// Join diagnostics.
    pub report: JoinReport,
}

/// A rendering session: memoized loads plus the viewport store.
pub struct RenderSession<G, T> {
    geometry: CachedRepository<G>,
    tables: CachedRepository<T>,
    config: CapsMapConfig,
    viewports: ViewportStore,
}

impl<G: GeometryRepository, T: TableRepository> RenderSession<G, T> {
    /// Creates a session over the given repositories.
    #[must_use]
    pub fn new(geometry: G, tables: T, config: CapsMapConfig) -> Self {
        Self {
            geometry: CachedRepository::new(geometry),
            tables: CachedRepository::new(tables),
            config,
            viewports: ViewportStore::new(),
        }
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &CapsMapConfig {
        &self.config
    }

    /// The per-state viewport store.
    #[must_use]
    pub const fn viewports(&self) -> &ViewportStore {
        &self.viewports
    }

    /// Records the view reported by the rendering collaborator.
    pub fn update_viewport(&mut self, state: StateCode, view: LastActiveView) {
        self.viewports.update(state, view);
    }

    /// Runs one render cycle for `state` and `year`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::YearOutOfRange`] for a year outside the
    /// configured range, [`RenderError::Geometry`] if the state's geometry
    /// cannot be loaded, [`RenderError::Table`] if a table exists but is
    /// malformed, or [`RenderError::Join`] if the service table lacks the
    /// year column.
    pub fn render(&mut self, state: StateCode, year: i32) -> Result<RenderBundle, RenderError> {
        let years = self.config.years;
        if !years.contains(year) {
            return Err(RenderError::YearOutOfRange {
                year,
                min: years.min,
                max: years.max,
            });
        }

        log::info!("Rendering {state} ({}) for {year}", state.name());

        let mut municipalities = GeometrySource::new(&self.geometry, self.config.geometry.clone())
            .load(state)?;

        let services = self.load_services(state, year)?;
        let populations = self.load_population(year)?;
        let report = join(&mut municipalities, &services, &populations, year)?;

        if let Some(population_year) = report.population_year {
            log::info!("{state}: using {population_year} population snapshot for {year}");
        }

        let scale = self.build_scale(&municipalities);
        let legend = scale.legend(self.config.scale.legend_stops);
        let style_fn = StyleFunction::new(
            &scale,
            &self.config.style,
            &self.config.scale.no_data_color,
        );
        let styles = municipalities
            .iter()
            .map(|m| style_fn.style_for(m.rate))
            .collect();

        let facilities = self.load_facilities(state)?;
        let viewport = self.viewports.get_or_insert_default(state, &municipalities);

        Ok(RenderBundle {
            state,
            year,
            population_year: report.population_year,
            features: export_municipalities(&municipalities),
            facilities: export_facilities(&facilities),
            scale,
            legend,
            style: self.config.style.clone(),
            styles,
            tooltip_fields: TOOLTIP_FIELDS.iter().map(ToString::to_string).collect(),
            viewport,
            report,
        })
    }

    /// Renders each of `states` for `year`, reporting progress per state.
    ///
    /// Failures are returned per state rather than aborting the batch.
    pub fn render_many(
        &mut self,
        states: &[StateCode],
        year: i32,
        progress: &dyn ProgressCallback,
    ) -> Vec<(StateCode, Result<RenderBundle, RenderError>)> {
        progress.set_total(states.len() as u64);

        let results = states
            .iter()
            .map(|&state| {
                progress.set_message(format!("Rendering {state}"));
                let result = self.render(state, year);
                progress.inc(1);
                (state, result)
            })
            .collect::<Vec<_>>();

        let rendered = results.iter().filter(|(_, r)| r.is_ok()).count();
        progress.finish(format!("Rendered {rendered}/{} states", states.len()));

        results
    }

    fn load_services(&self, state: StateCode, year: i32) -> Result<ServiceTable, RenderError> {
        match self.tables.service_table(state) {
            Ok(table) => Ok(table),
            Err(e) if e.is_not_found() => {
                log::warn!("{state}: no service table; every rate will be 0");
                Ok(ServiceTable {
                    years: std::iter::once(year).collect(),
                    records: vec![],
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the population snapshot nearest to `year`, falling back to the
    /// next nearest when a configured snapshot has no file.
    fn load_population(&self, year: i32) -> Result<Vec<PopulationTable>, RenderError> {
        let mut candidates = self.config.population.snapshot_years.clone();

        while let Some(snapshot) = closest_year(year, &candidates) {
            match self.tables.population_table(snapshot) {
                Ok(table) => return Ok(vec![table]),
                Err(e) if e.is_not_found() => {
                    log::warn!("No population table for {snapshot}; trying the next nearest");
                    candidates.retain(|&y| y != snapshot);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(vec![])
    }

    fn load_facilities(&self, state: StateCode) -> Result<Vec<FacilityPoint>, RenderError> {
        match self.tables.facilities(state) {
            Ok(points) => Ok(points),
            Err(e) if e.is_not_found() => {
                log::info!("{state}: no facility table; skipping overlay");
                Ok(vec![])
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Builds the scale over positive rates only. Zero means "no data" and
    /// is painted with the no-data color instead.
    fn build_scale(&self, municipalities: &[Municipality]) -> ColorScale {
        let rates: Vec<f64> = municipalities
            .iter()
            .map(|m| m.rate)
            .filter(|&rate| rate > 0.0)
            .collect();

        ColorScale::build(
            &rates,
            self.config.scale.transform,
            Palette::named(self.config.scale.palette),
        )
    }
}
