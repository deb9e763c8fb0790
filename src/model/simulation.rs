//! Simulation log: steps, the commands they issued and their results.
//!
//! The server tags commands with a `Verb` and results with a
//! `ChangeDescription`. Both map onto closed enums here, with an `Other`
//! variant that keeps whatever the server sent for tags we do not know, or for
//! known tags whose arguments do not parse.

use super::{Coalition, DateTime, OrientedPosition};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulationStep {
    pub description: String,
    #[serde(default, rename = "Command")]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub results: Vec<CommandResult>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildingPartDamage {
    pub building_at: OrientedPosition,
    pub part: u32,
    pub damage: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildingPartRepair {
    pub building_at: OrientedPosition,
    pub part: u32,
    pub repair: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaneChange {
    pub airfield: String,
    #[serde(default)]
    pub plane: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroundForcesChange {
    pub region: String,
    pub coalition: Coalition,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroundForcesMove {
    pub start: String,
    pub destination: String,
    pub coalition: Coalition,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegionOwnerChange {
    pub region: String,
    pub coalition: Coalition,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeAdvance {
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCommand")]
pub enum Command {
    DamageBuildingPart(BuildingPartDamage),
    RepairBuildingPart(BuildingPartRepair),
    AddPlane(PlaneChange),
    RemovePlane(PlaneChange),
    AddGroundForces(GroundForcesChange),
    DestroyGroundForces(GroundForcesChange),
    MoveGroundForces(GroundForcesMove),
    SetRegionOwner(RegionOwnerChange),
    AdvanceTime(TimeAdvance),
    Other { verb: String, args: Value },
}

impl Command {
    pub fn verb(&self) -> &str {
        match self {
            Command::DamageBuildingPart(_) => "DamageBuildingPart",
            Command::RepairBuildingPart(_) => "RepairBuildingPart",
            Command::AddPlane(_) => "AddPlane",
            Command::RemovePlane(_) => "RemovePlane",
            Command::AddGroundForces(_) => "AddGroundForces",
            Command::DestroyGroundForces(_) => "DestroyGroundForces",
            Command::MoveGroundForces(_) => "MoveGroundForces",
            Command::SetRegionOwner(_) => "SetRegionOwner",
            Command::AdvanceTime(_) => "AdvanceTime",
            Command::Other { verb, .. } => verb,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCommand {
    verb: String,
    #[serde(default)]
    args: Value,
}

impl From<RawCommand> for Command {
    fn from(raw: RawCommand) -> Self {
        let RawCommand { verb, args } = raw;
        let parsed = match verb.as_str() {
            "DamageBuildingPart" => parse_args(&args).map(Command::DamageBuildingPart),
            "RepairBuildingPart" => parse_args(&args).map(Command::RepairBuildingPart),
            "AddPlane" => parse_args(&args).map(Command::AddPlane),
            "RemovePlane" => parse_args(&args).map(Command::RemovePlane),
            "AddGroundForces" => parse_args(&args).map(Command::AddGroundForces),
            "DestroyGroundForces" => parse_args(&args).map(Command::DestroyGroundForces),
            "MoveGroundForces" => parse_args(&args).map(Command::MoveGroundForces),
            "SetRegionOwner" => parse_args(&args).map(Command::SetRegionOwner),
            "AdvanceTime" => parse_args(&args).map(Command::AdvanceTime),
            _ => None,
        };
        parsed.unwrap_or(Command::Other { verb, args })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageUpdate {
    pub building_at: OrientedPosition,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanesUpdate {
    pub airfield: String,
    #[serde(default)]
    pub planes: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroundForcesUpdate {
    pub region: String,
    pub coalition: Coalition,
    pub forces: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeSet {
    pub date_time: DateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawResult")]
pub enum CommandResult {
    UpdatedStorageValue(StorageUpdate),
    UpdatedPlanesAtAirfield(PlanesUpdate),
    UpdatedGroundForces(GroundForcesUpdate),
    RegionOwnerSet(RegionOwnerChange),
    TimeSet(TimeSet),
    Other { change: String, values: Value },
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResult {
    change_description: String,
    #[serde(default)]
    values: Value,
}

impl From<RawResult> for CommandResult {
    fn from(raw: RawResult) -> Self {
        let RawResult {
            change_description: change,
            values,
        } = raw;
        let parsed = match change.as_str() {
            "UpdatedStorageValue" => parse_args(&values).map(CommandResult::UpdatedStorageValue),
            "UpdatedPlanesAtAirfield" => {
                parse_args(&values).map(CommandResult::UpdatedPlanesAtAirfield)
            }
            "UpdatedGroundForces" => parse_args(&values).map(CommandResult::UpdatedGroundForces),
            "RegionOwnerSet" => parse_args(&values).map(CommandResult::RegionOwnerSet),
            "TimeSet" => parse_args(&values).map(CommandResult::TimeSet),
            _ => None,
        };
        parsed.unwrap_or(CommandResult::Other { change, values })
    }
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> Option<T> {
    match T::deserialize(args) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(error = %e, "Arguments did not match their tag, keeping raw value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_verbs_parse() {
        let json = r#"{
            "Description": "Plane took off",
            "Command": [
                {"Verb": "RemovePlane", "Args": {"Airfield": "A1", "Plane": "Bf109", "Amount": 2.0}},
                {"Verb": "SetRegionOwner", "Args": {"Region": "R1", "Coalition": "Axis"}},
                {"Verb": "AdvanceTime", "Args": {"Hours": 3.0}}
            ],
            "Results": [
                {"ChangeDescription": "RegionOwnerSet", "Values": {"Region": "R1", "Coalition": "Axis"}}
            ]
        }"#;
        let step: SimulationStep = serde_json::from_str(json).unwrap();
        assert_eq!(step.commands.len(), 3);
        match &step.commands[0] {
            Command::RemovePlane(change) => {
                assert_eq!(change.airfield, "A1");
                assert_eq!(change.amount, 2.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(step.commands[2], Command::AdvanceTime(TimeAdvance { hours: 3.0 }));
        assert!(matches!(step.results[0], CommandResult::RegionOwnerSet(_)));
    }

    #[test]
    fn test_unknown_verb_kept_as_other() {
        let json = r#"{"Verb": "SpawnConvoy", "Args": {"Size": 5}}"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.verb(), "SpawnConvoy");
        match cmd {
            Command::Other { args, .. } => assert_eq!(args["Size"], 5),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_malformed_args_fall_back_to_other() {
        let json = r#"{"Verb": "AddPlane", "Args": {"Plane": "Yak-1"}}"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, Command::Other { ref verb, .. } if verb == "AddPlane"));
    }

    #[test]
    fn test_unknown_result_kept_as_other() {
        let json = r#"{"ChangeDescription": "WeatherChanged", "Values": null}"#;
        let result: CommandResult = serde_json::from_str(json).unwrap();
        match result {
            CommandResult::Other { change, .. } => assert_eq!(change, "WeatherChanged"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
