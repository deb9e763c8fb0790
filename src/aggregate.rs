//! Derived quantities over one (World, WarState) pair.
//!
//! Everything here is a pure function over immutable snapshots. Missing data
//! counts as zero or empty: an absent owner is neutral, an absent plane map is
//! zero planes, an absent building-health record is a fully functional
//! building.

use crate::model::{
    Airfield, BuildingInstance, Coalition, Command, OrientedPosition, Region, SimulationStep,
    WarState, World,
};
use std::collections::HashSet;

/// How a building instance is matched to its per-day health record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildingMatch {
    /// Same comparison as the campaign's web client: X and altitude must be
    /// equal, Y and rotation only have to be numbers.
    #[default]
    Legacy,
    /// All four fields must be equal.
    Strict,
}

impl BuildingMatch {
    pub fn matches(self, instance: &OrientedPosition, record: &OrientedPosition) -> bool {
        match self {
            BuildingMatch::Legacy => legacy_position_eq(instance, record),
            BuildingMatch::Strict => {
                instance.position.x == record.position.x
                    && instance.position.y == record.position.y
                    && instance.altitude == record.altitude
                    && instance.rotation == record.rotation
            }
        }
    }
}

/// Reproduces the web client's `posEq`, which compares the instance's Y and
/// rotation with themselves. Only a NaN in the instance fails those two checks.
// TODO: replace with BuildingMatch::Strict once the server owners confirm the
// self-comparison is a typo and not intended tolerance.
pub fn legacy_position_eq(instance: &OrientedPosition, record: &OrientedPosition) -> bool {
    instance.position.x == record.position.x
        && !instance.position.y.is_nan()
        && instance.altitude == record.altitude
        && !instance.rotation.is_nan()
}

/// Sum starting from +0.0; `Iterator::sum` gives -0.0 for nothing.
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, x| acc + x)
}

pub fn owner_of(state: &WarState, region: &str) -> Option<Coalition> {
    state.region_owner.get(region).copied()
}

pub fn regions_owned_by<'w>(
    world: &'w World,
    state: &WarState,
    coalition: Coalition,
) -> Vec<&'w Region> {
    world
        .regions
        .iter()
        .filter(|r| owner_of(state, &r.id) == Some(coalition))
        .collect()
}

pub fn unowned_regions<'w>(world: &'w World, state: &WarState) -> Vec<&'w Region> {
    world
        .regions
        .iter()
        .filter(|r| owner_of(state, &r.id).is_none())
        .collect()
}

/// Airfields whose region is owned by `coalition`.
pub fn airfields_owned_by<'w>(
    world: &'w World,
    state: &WarState,
    coalition: Coalition,
) -> Vec<&'w Airfield> {
    world
        .airfields
        .iter()
        .filter(|af| owner_of(state, &af.region) == Some(coalition))
        .collect()
}

pub fn unowned_airfields<'w>(world: &'w World, state: &WarState) -> Vec<&'w Airfield> {
    world
        .airfields
        .iter()
        .filter(|af| owner_of(state, &af.region).is_none())
        .collect()
}

pub fn total_ground_forces(state: &WarState, coalition: Coalition) -> f64 {
    state
        .ground_forces
        .iter()
        .filter(|gf| gf.coalition == coalition)
        .map(|gf| gf.forces)
        .fold(0.0, |acc, x| acc + x)
}

pub fn ground_forces_in_region(state: &WarState, region: &str, coalition: Coalition) -> f64 {
    state
        .ground_forces
        .iter()
        .filter(|gf| gf.coalition == coalition && gf.region == region)
        .map(|gf| gf.forces)
        .fold(0.0, |acc, x| acc + x)
}

pub fn planes_at(state: &WarState, airfield: &str) -> f64 {
    state
        .planes
        .get(airfield)
        .map(|models| total(models.values().copied()))
        .unwrap_or(0.0)
}

pub fn total_planes(airfields: &[&Airfield], state: &WarState) -> f64 {
    total(airfields.iter().map(|af| planes_at(state, &af.id)))
}

/// Supply flow into a region in m³/h.
pub fn supplies_of(state: &WarState, region: &str) -> f64 {
    state.supply_status.get(region).copied().unwrap_or(0.0)
}

pub fn supplies_in(regions: &[&Region], state: &WarState) -> f64 {
    total(regions.iter().map(|r| supplies_of(state, &r.id)))
}

/// Functionality of the building at `position`, 1.0 when the day has no
/// record for it.
pub fn functionality_level(
    state: &WarState,
    position: &OrientedPosition,
    matching: BuildingMatch,
) -> f64 {
    state
        .building_health
        .iter()
        .find(|status| matching.matches(position, &status.position))
        .map(|status| status.functionality_level)
        .unwrap_or(1.0)
}

/// Usable storage of a set of buildings: nominal capacity weighted by
/// functionality, summed.
pub fn capacity_of(
    world: &World,
    buildings: &[BuildingInstance],
    state: &WarState,
    matching: BuildingMatch,
) -> f64 {
    buildings
        .iter()
        .map(|b| {
            let capacity = world
                .properties_of(b)
                .and_then(|props| props.capacity)
                .unwrap_or(0.0);
            capacity * functionality_level(state, &b.position, matching)
        })
        .fold(0.0, |acc, x| acc + x)
}

pub fn capacity_in_region(
    world: &World,
    region: &Region,
    state: &WarState,
    matching: BuildingMatch,
) -> f64 {
    capacity_of(world, &region.buildings, state, matching)
}

pub fn capacity_at_airfield(
    world: &World,
    airfield: &Airfield,
    state: &WarState,
    matching: BuildingMatch,
) -> f64 {
    capacity_of(world, &airfield.buildings, state, matching)
}

/// Plane losses reconstructed from simulation step descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaneLosses {
    /// Destroyed while parked
    pub strafed: f64,
    /// Departures that never came back
    pub shot: f64,
}

/// Best-effort loss inference from the wording of the simulation log. Take-offs
/// and landings/transfers cancel out; a net deficit counts as shot down.
pub fn inferred_plane_losses(airfields: &[&Airfield], steps: &[SimulationStep]) -> PlaneLosses {
    let ids: HashSet<&str> = airfields.iter().map(|af| af.id.as_str()).collect();
    let mut net_change = 0.0;
    let mut strafed = 0.0;

    for step in steps {
        let description = step.description.as_str();
        for cmd in &step.commands {
            match cmd {
                Command::AddPlane(change) if ids.contains(change.airfield.as_str()) => {
                    if description.contains("landed") || description.contains("transfered") {
                        net_change += change.amount;
                    } else {
                        tracing::debug!(description, "Unhandled plane addition");
                    }
                }
                Command::RemovePlane(change) if ids.contains(change.airfield.as_str()) => {
                    if description.contains("take off") {
                        net_change -= change.amount;
                    } else if description.contains("arked plane") {
                        strafed += change.amount;
                    } else {
                        tracing::debug!(description, "Unhandled plane removal");
                    }
                }
                _ => {}
            }
        }
    }

    tracing::trace!(strafed, net_change, "Inferred plane losses");
    PlaneLosses {
        strafed,
        shot: if net_change < 0.0 { -net_change } else { 0.0 },
    }
}

/// Per-coalition figures of one campaign day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoalitionSummary {
    pub regions: usize,
    pub supplies: f64,
    pub ground_forces: f64,
    pub planes: f64,
    pub region_storage: f64,
    pub airfield_storage: f64,
    pub losses: PlaneLosses,
}

impl CoalitionSummary {
    pub fn compute(
        world: &World,
        state: &WarState,
        steps: &[SimulationStep],
        coalition: Coalition,
        matching: BuildingMatch,
    ) -> Self {
        let regions = regions_owned_by(world, state, coalition);
        let airfields = airfields_owned_by(world, state, coalition);
        Self {
            regions: regions.len(),
            supplies: supplies_in(&regions, state),
            ground_forces: total_ground_forces(state, coalition),
            planes: total_planes(&airfields, state),
            region_storage: total(
                regions.iter().map(|r| capacity_in_region(world, r, state, matching)),
            ),
            airfield_storage: total(
                airfields.iter().map(|af| capacity_at_airfield(world, af, state, matching)),
            ),
            losses: inferred_plane_losses(&airfields, steps),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DaySummary {
    pub allies: CoalitionSummary,
    pub axis: CoalitionSummary,
}

impl DaySummary {
    /// Summary of a day; a missing state gives all zeros, a missing log gives
    /// zero losses.
    pub fn compute(
        world: &World,
        state: Option<&WarState>,
        steps: Option<&[SimulationStep]>,
        matching: BuildingMatch,
    ) -> Self {
        let Some(state) = state else {
            return Self::default();
        };
        let steps = steps.unwrap_or(&[]);
        Self {
            allies: CoalitionSummary::compute(world, state, steps, Coalition::Allies, matching),
            axis: CoalitionSummary::compute(world, state, steps, Coalition::Axis, matching),
        }
    }

    pub fn of(&self, coalition: Coalition) -> &CoalitionSummary {
        match coalition {
            Coalition::Allies => &self.allies,
            Coalition::Axis => &self.axis,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::*;

    pub fn at(x: f64, y: f64) -> OrientedPosition {
        OrientedPosition {
            position: Vector2::new(x, y),
            altitude: 0.0,
            rotation: 0.0,
        }
    }

    pub fn date(day: u32) -> DateTime {
        DateTime {
            year: 1944,
            month: 9,
            day,
            hour: 6,
            minute: 0,
        }
    }

    fn square(x: f64, y: f64) -> Vec<Vector2> {
        vec![
            Vector2::new(x, y),
            Vector2::new(x + 10.0, y),
            Vector2::new(x + 10.0, y + 10.0),
            Vector2::new(x, y + 10.0),
        ]
    }

    /// Three regions R1..R3, airfield A1 in R1 and A2 in R2. R1 holds one
    /// depot of 1000 m³, A1 one hangar of 200 m³.
    pub fn world() -> World {
        let region = |id: &str, x: f64, owner: Option<Coalition>, buildings| Region {
            id: id.to_string(),
            boundary: square(x, 0.0),
            position: Vector2::new(x + 5.0, 5.0),
            initial_owner: owner,
            buildings,
            neighbours: Vec::new(),
            is_entry: false,
        };
        World {
            scenario: "test".to_string(),
            map: "rheinland-summer".to_string(),
            map_south_west: Vector2::new(0.0, 0.0),
            map_north_east: Vector2::new(100.0, 100.0),
            regions: vec![
                region(
                    "R1",
                    0.0,
                    Some(Coalition::Allies),
                    vec![BuildingInstance {
                        position: at(1.0, 1.0),
                        properties_id: 0,
                    }],
                ),
                region("R2", 20.0, Some(Coalition::Axis), Vec::new()),
                region("R3", 40.0, None, Vec::new()),
            ],
            airfields: vec![
                Airfield {
                    id: "A1".to_string(),
                    position: Vector2::new(2.0, 2.0),
                    region: "R1".to_string(),
                    buildings: vec![BuildingInstance {
                        position: at(2.0, 3.0),
                        properties_id: 1,
                    }],
                },
                Airfield {
                    id: "A2".to_string(),
                    position: Vector2::new(22.0, 2.0),
                    region: "R2".to_string(),
                    buildings: Vec::new(),
                },
            ],
            plane_set: Vec::new(),
            building_properties: vec![
                BuildingProperties {
                    id: 0,
                    model: "depot".to_string(),
                    script: String::new(),
                    durability: 1000.0,
                    num_parts: 4,
                    capacity: Some(1000.0),
                },
                BuildingProperties {
                    id: 1,
                    model: "hangar".to_string(),
                    script: String::new(),
                    durability: 500.0,
                    num_parts: 2,
                    capacity: Some(200.0),
                },
                BuildingProperties {
                    id: 2,
                    model: "house".to_string(),
                    script: String::new(),
                    durability: 100.0,
                    num_parts: 1,
                    capacity: None,
                },
            ],
            bridges: Vec::new(),
            start_date: Some(date(1)),
        }
    }

    /// R1 Allies, R2 Axis, R3 neutral; troops on both sides of R1.
    pub fn state() -> WarState {
        let mut state = WarState::new(date(1));
        state.region_owner.insert("R1".to_string(), Coalition::Allies);
        state.region_owner.insert("R2".to_string(), Coalition::Axis);
        state.ground_forces = vec![
            GroundForces {
                region: "R1".to_string(),
                coalition: Coalition::Allies,
                forces: 300.0,
            },
            GroundForces {
                region: "R1".to_string(),
                coalition: Coalition::Axis,
                forces: 120.0,
            },
            GroundForces {
                region: "R2".to_string(),
                coalition: Coalition::Axis,
                forces: 80.0,
            },
        ];
        state.supply_status.insert("R1".to_string(), 1500.0);
        state.supply_status.insert("R2".to_string(), 700.0);
        state.planes.insert(
            "A1".to_string(),
            [("Spitfire".to_string(), 6.0), ("Typhoon".to_string(), 4.0)]
                .into_iter()
                .collect(),
        );
        state
            .planes
            .insert("A2".to_string(), [("Bf109".to_string(), 9.0)].into_iter().collect());
        state
    }

    pub fn step(description: &str, commands: Vec<Command>) -> SimulationStep {
        SimulationStep {
            description: description.to_string(),
            commands,
            results: Vec::new(),
        }
    }

    pub fn remove_plane(airfield: &str, amount: f64) -> Command {
        Command::RemovePlane(simulation::PlaneChange {
            airfield: airfield.to_string(),
            plane: "Spitfire".to_string(),
            amount,
        })
    }

    pub fn add_plane(airfield: &str, amount: f64) -> Command {
        Command::AddPlane(simulation::PlaneChange {
            airfield: airfield.to_string(),
            plane: "Spitfire".to_string(),
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::model::{BuildingStatus, GroundForces};

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> String) -> Vec<String> {
        items.iter().map(|i| id(*i)).collect()
    }

    #[test]
    fn test_ownership_partitions_regions_and_airfields() {
        let world = world();
        let state = state();
        let allies = regions_owned_by(&world, &state, Coalition::Allies);
        let axis = regions_owned_by(&world, &state, Coalition::Axis);
        let neutral = unowned_regions(&world, &state);
        assert_eq!(ids(&allies, |r: &Region| r.id.clone()), ["R1"]);
        assert_eq!(ids(&axis, |r: &Region| r.id.clone()), ["R2"]);
        assert_eq!(ids(&neutral, |r: &Region| r.id.clone()), ["R3"]);
        assert_eq!(allies.len() + axis.len() + neutral.len(), world.regions.len());

        let allied_fields = airfields_owned_by(&world, &state, Coalition::Allies);
        let axis_fields = airfields_owned_by(&world, &state, Coalition::Axis);
        let neutral_fields = unowned_airfields(&world, &state);
        assert_eq!(ids(&allied_fields, |a: &Airfield| a.id.clone()), ["A1"]);
        assert_eq!(ids(&axis_fields, |a: &Airfield| a.id.clone()), ["A2"]);
        assert!(neutral_fields.is_empty());
    }

    #[test]
    fn test_ground_forces_totals() {
        let state = state();
        assert_eq!(total_ground_forces(&state, Coalition::Allies), 300.0);
        assert_eq!(total_ground_forces(&state, Coalition::Axis), 200.0);
        assert_eq!(ground_forces_in_region(&state, "R1", Coalition::Axis), 120.0);
        assert_eq!(ground_forces_in_region(&state, "R3", Coalition::Axis), 0.0);
    }

    #[test]
    fn test_ground_forces_additive_over_disjoint_lists() {
        let forces = |region: &str, amount: f64| GroundForces {
            region: region.to_string(),
            coalition: Coalition::Axis,
            forces: amount,
        };
        let mut a = WarState::new(date(1));
        a.ground_forces = vec![forces("R1", 10.0), forces("R2", 32.5)];
        let mut b = WarState::new(date(1));
        b.ground_forces = vec![forces("R3", 7.5)];
        let mut merged = WarState::new(date(1));
        merged.ground_forces = a.ground_forces.iter().chain(&b.ground_forces).cloned().collect();
        assert_eq!(
            total_ground_forces(&merged, Coalition::Axis),
            total_ground_forces(&a, Coalition::Axis) + total_ground_forces(&b, Coalition::Axis)
        );
    }

    #[test]
    fn test_planes_missing_map_is_zero() {
        let world = world();
        let mut state = state();
        let fields: Vec<&Airfield> = world.airfields.iter().collect();
        assert_eq!(total_planes(&fields, &state), 19.0);
        state.planes.remove("A2");
        assert_eq!(total_planes(&fields, &state), 10.0);
        assert_eq!(planes_at(&state, "nowhere"), 0.0);
    }

    #[test]
    fn test_capacity_weighted_by_functionality() {
        let world = world();
        let mut state = state();
        let r1 = &world.regions[0];
        assert_eq!(capacity_in_region(&world, r1, &state, BuildingMatch::Legacy), 1000.0);

        state.building_health.push(BuildingStatus {
            position: at(1.0, 1.0),
            health_level: 0.5,
            functionality_level: 0.5,
        });
        assert_eq!(capacity_in_region(&world, r1, &state, BuildingMatch::Legacy), 500.0);
        assert_eq!(capacity_in_region(&world, r1, &state, BuildingMatch::Strict), 500.0);
    }

    #[test]
    fn test_capacity_monotonic_in_functionality() {
        let world = world();
        let r1 = &world.regions[0];
        let mut previous = 0.0;
        for level in [0.0, 0.1, 0.35, 0.5, 0.8, 0.99, 1.0] {
            let mut state = state();
            state.building_health.push(BuildingStatus {
                position: at(1.0, 1.0),
                health_level: level,
                functionality_level: level,
            });
            let capacity = capacity_in_region(&world, r1, &state, BuildingMatch::Strict);
            assert!(capacity >= previous);
            previous = capacity;
        }
    }

    #[test]
    fn test_null_capacity_counts_as_zero() {
        let world = world();
        let state = state();
        let houses = vec![BuildingInstance {
            position: at(9.0, 9.0),
            properties_id: 2,
        }];
        assert_eq!(capacity_of(&world, &houses, &state, BuildingMatch::Strict), 0.0);
        let unknown = vec![BuildingInstance {
            position: at(9.0, 9.0),
            properties_id: 42,
        }];
        assert_eq!(capacity_of(&world, &unknown, &state, BuildingMatch::Strict), 0.0);
    }

    #[test]
    fn test_legacy_match_ignores_y_and_rotation() {
        let instance = at(1.0, 1.0);
        let mut record = at(1.0, 99.0);
        record.rotation = 45.0;
        assert!(BuildingMatch::Legacy.matches(&instance, &record));
        assert!(!BuildingMatch::Strict.matches(&instance, &record));

        record.altitude = 3.0;
        assert!(!BuildingMatch::Legacy.matches(&instance, &record));

        // Only the instance's own Y and rotation are checked, against themselves
        let nan_record = at(1.0, f64::NAN);
        assert!(BuildingMatch::Legacy.matches(&instance, &nan_record));
        let nan_instance = at(1.0, f64::NAN);
        assert!(!BuildingMatch::Legacy.matches(&nan_instance, &at(1.0, 1.0)));
        let mut turned = at(1.0, 1.0);
        turned.rotation = f64::NAN;
        assert!(!BuildingMatch::Legacy.matches(&turned, &at(1.0, 1.0)));
    }

    #[test]
    fn test_empty_sums_are_positive_zero() {
        let world = world();
        let state = state();
        let storage = capacity_of(&world, &[], &state, BuildingMatch::Legacy);
        assert!(storage.is_sign_positive());
        assert_eq!(format!("storage: {} m^3", storage.round()), "storage: 0 m^3");
        assert!(total_planes(&[], &state).is_sign_positive());
        assert!(supplies_in(&[], &state).is_sign_positive());
        assert!(ground_forces_in_region(&state, "nowhere", Coalition::Axis).is_sign_positive());
        let empty = WarState::new(date(1));
        assert!(total_ground_forces(&empty, Coalition::Allies).is_sign_positive());
    }

    #[test]
    fn test_takeoff_and_landing_cancel() {
        let world = world();
        let a1: Vec<&Airfield> = world.airfields.iter().filter(|af| af.id == "A1").collect();
        let steps = vec![
            step("Plane took off", vec![remove_plane("A1", 2.0)]),
            step("Plane landed", vec![add_plane("A1", 2.0)]),
        ];
        // "took off" is not "take off": the removal is unhandled, and so the
        // landing leaves a positive net change
        assert_eq!(
            inferred_plane_losses(&a1, &steps),
            PlaneLosses {
                strafed: 0.0,
                shot: 0.0
            }
        );

        let steps = vec![
            step("Plane take off from A1", vec![remove_plane("A1", 2.0)]),
            step("Plane landed at A1", vec![add_plane("A1", 2.0)]),
        ];
        assert_eq!(inferred_plane_losses(&a1, &steps), PlaneLosses::default());
    }

    #[test]
    fn test_parked_planes_are_strafed() {
        let world = world();
        let a1: Vec<&Airfield> = world.airfields.iter().filter(|af| af.id == "A1").collect();
        let steps = vec![step("Parked plane destroyed", vec![remove_plane("A1", 3.0)])];
        assert_eq!(
            inferred_plane_losses(&a1, &steps),
            PlaneLosses {
                strafed: 3.0,
                shot: 0.0
            }
        );
    }

    #[test]
    fn test_unreturned_sorties_are_shot() {
        let world = world();
        let a1: Vec<&Airfield> = world.airfields.iter().filter(|af| af.id == "A1").collect();
        let steps = vec![
            step("Flight of 4 take off", vec![remove_plane("A1", 4.0)]),
            step("Plane landed", vec![add_plane("A1", 1.0)]),
            step("Plane transfered from A2", vec![add_plane("A1", 1.0)]),
            step("Plane take off", vec![remove_plane("A2", 8.0)]),
            step("Plane repaired", vec![add_plane("A1", 5.0)]),
        ];
        assert_eq!(
            inferred_plane_losses(&a1, &steps),
            PlaneLosses {
                strafed: 0.0,
                shot: 2.0
            }
        );
    }

    #[test]
    fn test_day_summary() {
        let world = world();
        let state = state();
        let steps = vec![step("Parked plane destroyed", vec![remove_plane("A2", 2.0)])];
        let summary = DaySummary::compute(
            &world,
            Some(&state),
            Some(steps.as_slice()),
            BuildingMatch::Legacy,
        );
        assert_eq!(summary.allies.regions, 1);
        assert_eq!(summary.allies.supplies, 1500.0);
        assert_eq!(summary.allies.region_storage, 1000.0);
        assert_eq!(summary.allies.airfield_storage, 200.0);
        assert_eq!(summary.allies.planes, 10.0);
        assert_eq!(summary.axis.planes, 9.0);
        assert_eq!(summary.of(Coalition::Axis).losses.strafed, 2.0);
        assert_eq!(summary.axis.ground_forces, 200.0);

        let empty = DaySummary::compute(&world, None, None, BuildingMatch::Legacy);
        assert_eq!(empty, DaySummary::default());
    }
}
