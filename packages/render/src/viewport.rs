//! Per-session map viewport store.
//!
//! Holds the last view the rendering collaborator reported for each state.
//! A state seen for the first time gets a view centered on its loaded
//! boundaries.

use std::collections::BTreeMap;

use caps_map_municipality_models::{LastActiveView, Municipality, StateCode, Viewport};
use geo::{BoundingRect, Rect};

/// Zoom used for a state's computed default view.
pub const STATE_ZOOM: u8 = 6;

/// Last known viewport per state.
#[derive(Debug, Clone, Default)]
pub struct ViewportStore {
    views: BTreeMap<StateCode, Viewport>,
}

impl ViewportStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            views: BTreeMap::new(),
        }
    }

    /// The stored view for `state`, if one was recorded.
    #[must_use]
    pub fn get(&self, state: StateCode) -> Option<Viewport> {
        self.views.get(&state).copied()
    }

    /// The stored view for `state`, recording the default computed from
    /// `municipalities` first if there is none.
    pub fn get_or_insert_default(
        &mut self,
        state: StateCode,
        municipalities: &[Municipality],
    ) -> Viewport {
        *self
            .views
            .entry(state)
            .or_insert_with(|| default_view(municipalities))
    }

    /// Records the view reported after a map interaction.
    pub fn update(&mut self, state: StateCode, view: LastActiveView) {
        let viewport = Viewport::from(view);
        log::debug!(
            "{state}: viewport now [{}, {}] zoom {}",
            viewport.center[0],
            viewport.center[1],
            viewport.zoom
        );
        self.views.insert(state, viewport);
    }
}

/// The view centered on the bounding box of `municipalities` at
/// [`STATE_ZOOM`], or [`Viewport::BRAZIL`] when they have no coordinates.
#[must_use]
pub fn default_view(municipalities: &[Municipality]) -> Viewport {
    let bounds = municipalities
        .iter()
        .filter_map(|m| m.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        });

    bounds.map_or(Viewport::BRAZIL, |rect| {
        let center = rect.center();
        Viewport {
            center: [center.y, center.x],
            zoom: STATE_ZOOM,
        }
    })
}
