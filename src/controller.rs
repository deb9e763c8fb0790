//! Day navigation: which campaign day is shown, and the overlays derived
//! from it.
//!
//! Selecting a day bumps a request generation. Only the result carrying the
//! newest generation may become the displayed day; anything older that
//! completes afterwards is dropped. A loaded day replaces the whole
//! [`DayView`], never parts of it.

use crate::aggregate::{self, BuildingMatch};
use crate::client::DataSource;
use crate::events::{event_list, EventEntry};
use crate::map::transform::{DisplayCoord, WorldTransform};
use crate::model::{owner_label, Coalition, SimulationStep, WarState, World};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("The campaign has no dates yet")]
    NoDates,
    #[error("Day {day} is out of range, the campaign has {count} days")]
    OutOfRange { day: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelection {
    /// The last date the server knows about
    Latest,
    Day(usize),
}

/// A day fetch in flight, tagged with the selection that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRequest {
    pub day: usize,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Unselected,
    Loading { day: usize, generation: u64 },
    Loaded { day: usize },
}

#[derive(Debug, Clone)]
pub struct DayNavigator {
    day_count: usize,
    generation: u64,
    state: NavState,
}

impl DayNavigator {
    pub fn new(day_count: usize) -> Self {
        Self {
            day_count,
            generation: 0,
            state: NavState::Unselected,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn day_count(&self) -> usize {
        self.day_count
    }

    /// Day currently on screen, if any.
    pub fn displayed_day(&self) -> Option<usize> {
        match self.state {
            NavState::Loaded { day } => Some(day),
            _ => None,
        }
    }

    pub fn resolve(&self, selection: DaySelection) -> Result<usize, NavigationError> {
        if self.day_count == 0 {
            return Err(NavigationError::NoDates);
        }
        match selection {
            DaySelection::Latest => Ok(self.day_count - 1),
            DaySelection::Day(day) if day < self.day_count => Ok(day),
            DaySelection::Day(day) => Err(NavigationError::OutOfRange {
                day,
                count: self.day_count,
            }),
        }
    }

    /// Start loading a day. Any request issued before this one becomes stale.
    pub fn select(&mut self, selection: DaySelection) -> Result<DayRequest, NavigationError> {
        let day = self.resolve(selection)?;
        self.generation += 1;
        self.state = NavState::Loading {
            day,
            generation: self.generation,
        };
        tracing::debug!(day, generation = self.generation, "Day selected");
        Ok(DayRequest {
            day,
            generation: self.generation,
        })
    }

    pub fn is_current(&self, request: &DayRequest) -> bool {
        self.state
            == NavState::Loading {
                day: request.day,
                generation: request.generation,
            }
    }

    /// Mark a request finished. Returns false, leaving the state untouched, if
    /// a newer selection has been made since.
    pub fn complete(&mut self, request: &DayRequest) -> bool {
        if !self.is_current(request) {
            tracing::debug!(
                day = request.day,
                generation = request.generation,
                latest = self.generation,
                "Discarding stale day result"
            );
            return false;
        }
        self.state = NavState::Loaded { day: request.day };
        true
    }
}

/// Everything fetched for one day. A failed fetch leaves its part empty.
#[derive(Debug, Clone, Default)]
pub struct DayData {
    pub state: Option<WarState>,
    pub steps: Vec<SimulationStep>,
}

/// Fetch the state of `day` and the log of the steps that start from it,
/// which the server files under `day + 1`.
pub async fn load_day(source: &dyn DataSource, day: usize) -> DayData {
    let (state, steps) = tokio::join!(source.state(day), source.simulation_steps(day + 1));
    let state = match state {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(day, error = %e, "Failed to fetch war state");
            None
        }
    };
    let steps = match steps {
        Ok(steps) => steps,
        Err(e) => {
            tracing::warn!(day = day + 1, error = %e, "Failed to fetch simulation steps");
            Vec::new()
        }
    };
    DayData { state, steps }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Region,
    Airfield,
}

/// Fixed map marker. Its colour follows the initial owner and does not
/// change from day to day.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub id: String,
    pub at: DisplayCoord,
    pub owner: Option<Coalition>,
}

pub fn markers(world: &World, transform: &WorldTransform) -> Vec<Marker> {
    let regions = world.regions.iter().map(|r| Marker {
        kind: MarkerKind::Region,
        id: r.id.clone(),
        at: transform.apply(r.position),
        owner: r.initial_owner,
    });
    let airfields = world.airfields.iter().map(|af| Marker {
        kind: MarkerKind::Airfield,
        id: af.id.clone(),
        at: transform.apply(af.position),
        owner: world.region(&af.region).and_then(|r| r.initial_owner),
    });
    regions.chain(airfields).collect()
}

/// Region outline coloured by the region's owner on the displayed day.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub region_id: String,
    pub owner: Option<Coalition>,
    pub ring: Vec<DisplayCoord>,
}

/// Displayed state of one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayView {
    pub borders: Vec<Border>,
    pub region_popups: HashMap<String, Vec<String>>,
    pub airfield_popups: HashMap<String, Vec<String>>,
    pub events: Vec<EventEntry>,
}

impl DayView {
    pub fn build(
        world: &World,
        transform: &WorldTransform,
        data: &DayData,
        matching: BuildingMatch,
    ) -> Self {
        let events = event_list(&data.steps);
        let Some(state) = &data.state else {
            return Self {
                events,
                ..Self::default()
            };
        };

        let borders = world
            .regions
            .iter()
            .map(|region| Border {
                region_id: region.id.clone(),
                owner: aggregate::owner_of(state, &region.id),
                ring: transform.apply_ring(&region.boundary),
            })
            .collect();

        let region_popups = world
            .regions
            .iter()
            .map(|region| {
                let supplies = aggregate::supplies_of(state, &region.id).round();
                let storage = aggregate::capacity_in_region(world, region, state, matching).round();
                let mut lines = vec![
                    format!("logistics: {} m^3/h", supplies),
                    format!("storage: {} m^3", storage),
                ];
                if let Some(owner) = aggregate::owner_of(state, &region.id) {
                    let defenders = aggregate::ground_forces_in_region(state, &region.id, owner);
                    let attackers =
                        aggregate::ground_forces_in_region(state, &region.id, owner.other());
                    if defenders > 0.0 {
                        lines.push(format!("defenders: {}", defenders.round()));
                    }
                    if attackers > 0.0 {
                        lines.push(format!("attackers: {}", attackers.round()));
                    }
                }
                (region.id.clone(), lines)
            })
            .collect();

        let airfield_popups = world
            .airfields
            .iter()
            .map(|airfield| {
                let planes = aggregate::planes_at(state, &airfield.id).trunc();
                let storage =
                    aggregate::capacity_at_airfield(world, airfield, state, matching).round();
                let lines = vec![
                    format!("storage: {} m^3", storage),
                    format!("planes: {}", planes),
                ];
                (airfield.id.clone(), lines)
            })
            .collect();

        tracing::debug!(
            regions = world.regions.len(),
            airfields = world.airfields.len(),
            events = events.len(),
            "Day view built"
        );

        Self {
            borders,
            region_popups,
            airfield_popups,
            events,
        }
    }

    /// Popup of a marker, or nothing when the day has no state.
    pub fn popup(&self, marker: &Marker) -> Option<&[String]> {
        let popups = match marker.kind {
            MarkerKind::Region => &self.region_popups,
            MarkerKind::Airfield => &self.airfield_popups,
        };
        popups.get(&marker.id).map(Vec::as_slice)
    }

    pub fn owner_counts(&self) -> [(String, usize); 3] {
        let count =
            |owner: Option<Coalition>| self.borders.iter().filter(|b| b.owner == owner).count();
        [
            (owner_label(Some(Coalition::Allies)).to_string(), count(Some(Coalition::Allies))),
            (owner_label(Some(Coalition::Axis)).to_string(), count(Some(Coalition::Axis))),
            (owner_label(None).to_string(), count(None)),
        ]
    }
}
