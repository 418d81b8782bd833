//! Load memoization.
//!
//! Source files do not change during a session, so raw loads are keyed by
//! their input (state code or snapshot year) and reused. Only successful
//! loads are cached; a `NotFound` is asked again next time.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use caps_map_geometry::{GeometryError, GeometryRepository, RawLayer};
use caps_map_municipality_models::{FacilityPoint, PopulationTable, ServiceTable, StateCode};
use caps_map_tables::{TableError, TableRepository};

/// Wraps a geometry or table repository and memoizes its loads.
pub struct CachedRepository<R> {
    inner: R,
    layers: Mutex<BTreeMap<StateCode, RawLayer>>,
    services: Mutex<BTreeMap<StateCode, ServiceTable>>,
    populations: Mutex<BTreeMap<i32, PopulationTable>>,
    facilities: Mutex<BTreeMap<StateCode, Vec<FacilityPoint>>>,
}

impl<R> CachedRepository<R> {
    /// Wraps `inner` with empty caches.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            layers: Mutex::new(BTreeMap::new()),
            services: Mutex::new(BTreeMap::new()),
            populations: Mutex::new(BTreeMap::new()),
            facilities: Mutex::new(BTreeMap::new()),
        }
    }

    /// The wrapped repository.
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.inner
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn memoize<K: Ord + Copy, V: Clone, E>(
    cache: &Mutex<BTreeMap<K, V>>,
    key: K,
    load: impl FnOnce() -> Result<V, E>,
) -> Result<V, E> {
    if let Some(hit) = lock(cache).get(&key) {
        return Ok(hit.clone());
    }

    let value = load()?;
    lock(cache).insert(key, value.clone());
    Ok(value)
}

impl<R: GeometryRepository> GeometryRepository for CachedRepository<R> {
    fn fetch(&self, state: StateCode) -> Result<RawLayer, GeometryError> {
        memoize(&self.layers, state, || self.inner.fetch(state))
    }
}

impl<R: TableRepository> TableRepository for CachedRepository<R> {
    fn service_table(&self, state: StateCode) -> Result<ServiceTable, TableError> {
        memoize(&self.services, state, || self.inner.service_table(state))
    }

    fn population_table(&self, year: i32) -> Result<PopulationTable, TableError> {
        memoize(&self.populations, year, || self.inner.population_table(year))
    }

    fn facilities(&self, state: StateCode) -> Result<Vec<FacilityPoint>, TableError> {
        memoize(&self.facilities, state, || self.inner.facilities(state))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use caps_map_municipality_models::PopulationRecord;
    use caps_map_tables::TableKind;

    use super::*;

    #[derive(Default)]
    struct CountingRepository {
        fetches: AtomicUsize,
        population_loads: AtomicUsize,
    }

    impl GeometryRepository for CountingRepository {
        fn fetch(&self, state: StateCode) -> Result<RawLayer, GeometryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if state == StateCode::Sp {
                Ok(RawLayer {
                    crs: Some("EPSG:4326".to_string()),
                    features: vec![],
                })
            } else {
                Err(GeometryError::NotFound { state })
            }
        }
    }

    impl TableRepository for CountingRepository {
        fn service_table(&self, state: StateCode) -> Result<ServiceTable, TableError> {
            Err(TableError::NotFound {
                kind: TableKind::Service,
                key: state.to_string(),
            })
        }

        fn population_table(&self, year: i32) -> Result<PopulationTable, TableError> {
            self.population_loads.fetch_add(1, Ordering::SeqCst);
            Ok(PopulationTable {
                year,
                records: vec![PopulationRecord {
                    city_name: "Campinas".to_string(),
                    population: Some(1_000_000),
                }],
            })
        }

        fn facilities(&self, _state: StateCode) -> Result<Vec<FacilityPoint>, TableError> {
            Ok(vec![])
        }
    }

    #[test]
    fn repeated_fetch_hits_cache() {
        let cached = CachedRepository::new(CountingRepository::default());
        let first = cached.fetch(StateCode::Sp).unwrap();
        let second = cached.fetch(StateCode::Sp).unwrap();
        assert_eq!(first.crs, second.crs);
        assert_eq!(cached.inner().fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn not_found_is_not_cached() {
        let cached = CachedRepository::new(CountingRepository::default());
        assert!(cached.fetch(StateCode::Rj).is_err());
        assert!(cached.fetch(StateCode::Rj).is_err());
        assert_eq!(cached.inner().fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn population_tables_are_keyed_by_year() {
        let cached = CachedRepository::new(CountingRepository::default());
        let a = cached.population_table(2022).unwrap();
        let b = cached.population_table(2022).unwrap();
        let c = cached.population_table(2020).unwrap();
        assert_eq!(a, b);
        assert_eq!(c.year, 2020);
        assert_eq!(cached.inner().population_loads.load(Ordering::SeqCst), 2);
    }
}
