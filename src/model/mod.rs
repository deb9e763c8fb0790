//! Data model of the campaign server's query API.
//!
//! Field names follow the server's PascalCase JSON. Every collection defaults
//! to empty when missing, and `null` dictionary entries are dropped on the way
//! in, so the rest of the crate never has to tell "absent" from "null".

pub mod pilot;
pub mod simulation;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

pub use pilot::{
    DamagedTarget, HealthStatus, MissionRecord, Online, Pilot, PilotWithMissions, Player,
    ReturnStatus, TargetType,
};
pub use simulation::{Command, CommandResult, SimulationStep};

/// One of the two opposing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coalition {
    Allies,
    Axis,
}

impl Coalition {
    pub const ALL: [Coalition; 2] = [Coalition::Allies, Coalition::Axis];

    pub fn other(self) -> Self {
        match self {
            Coalition::Allies => Coalition::Axis,
            Coalition::Axis => Coalition::Allies,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Coalition::Allies => "Allies",
            Coalition::Axis => "Axis",
        }
    }
}

impl fmt::Display for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner label used wherever an unowned region has to be named.
pub fn owner_label(owner: Option<Coalition>) -> &'static str {
    owner.map(Coalition::as_str).unwrap_or("Neutral")
}

/// Game-world 2D position. X grows northwards, Y eastwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_dvec2(self) -> glam::DVec2 {
        glam::DVec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrientedPosition {
    pub position: Vector2,
    pub altitude: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildingProperties {
    pub id: u32,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub durability: f64,
    #[serde(default)]
    pub num_parts: u32,
    /// Storage capacity in m³, `None` for buildings that store nothing.
    #[serde(default)]
    pub capacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildingInstance {
    pub position: OrientedPosition,
    pub properties_id: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub boundary: Vec<Vector2>,
    pub position: Vector2,
    #[serde(default)]
    pub initial_owner: Option<Coalition>,
    #[serde(default)]
    pub buildings: Vec<BuildingInstance>,
    #[serde(default)]
    pub neighbours: Vec<String>,
    #[serde(default)]
    pub is_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Airfield {
    pub id: String,
    pub position: Vector2,
    pub region: String,
    #[serde(default)]
    pub buildings: Vec<BuildingInstance>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaneModel {
    pub name: String,
}

/// Static topology of a campaign, fetched once per session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct World {
    #[serde(default)]
    pub scenario: String,
    pub map: String,
    pub map_south_west: Vector2,
    pub map_north_east: Vector2,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub airfields: Vec<Airfield>,
    #[serde(default)]
    pub plane_set: Vec<PlaneModel>,
    #[serde(default)]
    pub building_properties: Vec<BuildingProperties>,
    #[serde(default)]
    pub bridges: Vec<BuildingInstance>,
    #[serde(default)]
    pub start_date: Option<DateTime>,
}

impl World {
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn airfield(&self, id: &str) -> Option<&Airfield> {
        self.airfields.iter().find(|af| af.id == id)
    }

    /// Properties referenced by a building instance. `PropertiesId` is an index
    /// into `BuildingProperties`; a mismatching entry falls back to a search.
    pub fn properties_of(&self, building: &BuildingInstance) -> Option<&BuildingProperties> {
        let id = building.properties_id;
        match self.building_properties.get(id as usize) {
            Some(props) if props.id == id => Some(props),
            _ => self.building_properties.iter().find(|p| p.id == id),
        }
    }
}

/// Plain calendar date and time, no timezone. Ordering of campaign days is the
/// index in the server's date list, never this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02} {}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroundForces {
    pub region: String,
    pub coalition: Coalition,
    pub forces: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildingStatus {
    pub position: OrientedPosition,
    #[serde(default)]
    pub health_level: f64,
    pub functionality_level: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransportCapacity {
    pub region_a: String,
    pub region_b: String,
    pub capacity: f64,
}

/// Dated snapshot of all dynamic campaign quantities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WarState {
    pub date: DateTime,
    #[serde(default)]
    pub ground_forces: Vec<GroundForces>,
    #[serde(default, deserialize_with = "non_null_map")]
    pub region_owner: HashMap<String, Coalition>,
    #[serde(default, deserialize_with = "non_null_map")]
    pub supply_status: HashMap<String, f64>,
    #[serde(default, deserialize_with = "plane_counts")]
    pub planes: HashMap<String, HashMap<String, f64>>,
    #[serde(default)]
    pub building_health: Vec<BuildingStatus>,
    #[serde(default)]
    pub bridge_health: Vec<BuildingStatus>,
    #[serde(default)]
    pub road_transport: Vec<TransportCapacity>,
    #[serde(default)]
    pub rail_transport: Vec<TransportCapacity>,
    #[serde(default)]
    pub weather: serde_json::Value,
}

impl WarState {
    /// A snapshot with nothing in it but its date.
    pub fn new(date: DateTime) -> Self {
        Self {
            date,
            ground_forces: Vec::new(),
            region_owner: HashMap::new(),
            supply_status: HashMap::new(),
            planes: HashMap::new(),
            building_health: Vec::new(),
            bridge_health: Vec::new(),
            road_transport: Vec::new(),
            rail_transport: Vec::new(),
            weather: serde_json::Value::Null,
        }
    }
}

/// `{ "Value": ... }` wrapper used by the status and control endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValueOf<T> {
    pub value: T,
}

/// Deserialize a dictionary whose values may be `null`, dropping those entries.
fn non_null_map<'de, D, K, V>(deserializer: D) -> Result<HashMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    let raw: Option<HashMap<K, Option<V>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

/// Airfield to plane-model counts, dropping `null` airfields and `null` counts.
fn plane_counts<'de, D>(deserializer: D) -> Result<HashMap<String, HashMap<String, f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    type Raw = HashMap<String, Option<HashMap<String, Option<f64>>>>;
    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(airfield, models)| {
            let models = models?
                .into_iter()
                .filter_map(|(model, count)| count.map(|c| (model, c)))
                .collect();
            Some((airfield, models))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_formatting() {
        let date = DateTime {
            year: 1944,
            month: 9,
            day: 3,
            hour: 7,
            minute: 5,
        };
        assert_eq!(date.to_string(), "1944-09-03 7:05");
    }

    #[test]
    fn test_war_state_drops_null_owners() {
        let json = r#"{
            "Date": {"Year": 1944, "Month": 9, "Day": 1, "Hour": 6, "Minute": 0},
            "RegionOwner": {"R1": "Allies", "R2": null, "R3": "Axis"},
            "Planes": {"A1": {"Bf109": 4.0}, "A2": null}
        }"#;
        let state: WarState = serde_json::from_str(json).unwrap();
        assert_eq!(state.region_owner.len(), 2);
        assert_eq!(state.region_owner.get("R1"), Some(&Coalition::Allies));
        assert!(state.region_owner.get("R2").is_none());
        assert_eq!(state.planes.len(), 1);
        assert!(state.ground_forces.is_empty());
        assert!(state.building_health.is_empty());
    }

    #[test]
    fn test_war_state_drops_null_plane_counts() {
        let json = r#"{
            "Date": {"Year": 1944, "Month": 9, "Day": 1, "Hour": 6, "Minute": 0},
            "Planes": {"A1": {"Bf109": null, "Fw190": 3.0}, "A2": {"Yak-1": null}}
        }"#;
        let state: WarState = serde_json::from_str(json).unwrap();
        assert_eq!(state.planes.len(), 2);
        assert_eq!(state.planes["A1"].len(), 1);
        assert_eq!(state.planes["A1"].get("Fw190"), Some(&3.0));
        assert!(state.planes["A2"].is_empty());
    }

    #[test]
    fn test_world_properties_lookup() {
        let json = r#"{
            "Map": "rheinland-summer",
            "MapSouthWest": {"X": 0.0, "Y": 0.0},
            "MapNorthEast": {"X": 100.0, "Y": 200.0},
            "BuildingProperties": [
                {"Id": 1, "Model": "b", "Capacity": 500.0},
                {"Id": 0, "Model": "a", "Capacity": null}
            ]
        }"#;
        let world: World = serde_json::from_str(json).unwrap();
        let building = BuildingInstance {
            position: OrientedPosition::default(),
            properties_id: 1,
        };
        // Index 1 holds Id 0, so the lookup has to search
        let props = world.properties_of(&building).unwrap();
        assert_eq!(props.capacity, Some(500.0));
        assert!(world.regions.is_empty());
    }

    #[test]
    fn test_coalition_other() {
        assert_eq!(Coalition::Allies.other(), Coalition::Axis);
        assert_eq!(Coalition::Axis.other(), Coalition::Allies);
        assert_eq!(owner_label(None), "Neutral");
    }
}
