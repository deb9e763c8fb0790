use super::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UntilDateTime {
    pub until: DateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Dead,
    Injured(UntilDateTime),
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => f.write_str("Healthy"),
            HealthStatus::Dead => f.write_str("Dead"),
            HealthStatus::Injured(until) => write!(f, "Injured until {}", until.until),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pilot {
    pub id: String,
    pub rank: String,
    pub rank_abbrev: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub player_name: String,
    pub health: HealthStatus,
    pub flights: u32,
    pub air_kills: u32,
}

impl Pilot {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum TargetType {
    Ship(String),
    Artillery(String),
    Vehicle(String),
    ParkedPlane(String),
    Plane(String),
    Building(String),
    Bridge(String),
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Planes are named by model, everything else by kind
        let label = match self {
            TargetType::Ship(_) => "Ship",
            TargetType::Artillery(_) => "Artillery",
            TargetType::Vehicle(_) => "Vehicle",
            TargetType::ParkedPlane(_) => "ParkedPlane",
            TargetType::Building(_) => "Building",
            TargetType::Bridge(_) => "Bridge",
            TargetType::Plane(model) => model,
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DamagedTarget {
    pub amount: f64,
    pub ammo: String,
    pub target: TargetType,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum ReturnStatus {
    LandedAtAirfield(String),
    CrashedInFriendlyTerritory,
    CrashedInEnemyTerritory,
    KilledInAction,
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnStatus::LandedAtAirfield(airfield) => write!(f, "At {}", airfield),
            ReturnStatus::CrashedInFriendlyTerritory => f.write_str("Crash landed"),
            ReturnStatus::CrashedInEnemyTerritory => f.write_str("Captured"),
            ReturnStatus::KilledInAction => f.write_str("Killed in action"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MissionRecord {
    pub start_airfield: String,
    pub start_date: DateTime,
    pub end_date: DateTime,
    #[serde(default)]
    pub damaged_targets: Vec<DamagedTarget>,
    pub air_kills: u32,
    pub return_status: ReturnStatus,
    pub plane: String,
    pub plane_health: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PilotWithMissions {
    pub pilot: Pilot,
    #[serde(default)]
    pub missions: Vec<MissionRecord>,
}

impl PilotWithMissions {
    /// Status of the latest mission, or "Inactive" for pilots who never flew.
    pub fn last_status(&self) -> String {
        self.missions
            .last()
            .map(|m| m.return_status.to_string())
            .unwrap_or_else(|| "Inactive".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HashedGuid {
    pub guid: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Player {
    pub guid: HashedGuid,
    pub name: String,
    #[serde(default)]
    pub pilots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Online {
    #[serde(default)]
    pub players: Vec<String>,
}

/// Filter for `/query/pilots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum HealthFilter {
    OnlyHealthy,
    NoDead,
}

impl HealthFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthFilter::OnlyHealthy => "OnlyHealthy",
            HealthFilter::NoDead => "NoDead",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PilotFilter {
    pub health: Option<HealthFilter>,
    pub coalition: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_variants() {
        let healthy: HealthStatus = serde_json::from_str(r#""Healthy""#).unwrap();
        assert_eq!(healthy.to_string(), "Healthy");

        let injured: HealthStatus = serde_json::from_str(
            r#"{"Injured": {"Until": {"Year": 1944, "Month": 10, "Day": 2, "Hour": 12, "Minute": 0}}}"#,
        )
        .unwrap();
        assert_eq!(injured.to_string(), "Injured until 1944-10-02 12:00");
    }

    #[test]
    fn test_return_status_text() {
        let landed: ReturnStatus = serde_json::from_str(r#"{"LandedAtAirfield": "Bonn"}"#).unwrap();
        assert_eq!(landed.to_string(), "At Bonn");
        let kia: ReturnStatus = serde_json::from_str(r#""KilledInAction""#).unwrap();
        assert_eq!(kia.to_string(), "Killed in action");
        let captured: ReturnStatus = serde_json::from_str(r#""CrashedInEnemyTerritory""#).unwrap();
        assert_eq!(captured.to_string(), "Captured");
    }

    #[test]
    fn test_target_names() {
        let plane: TargetType = serde_json::from_str(r#"{"Plane": "Spitfire Mk.IX"}"#).unwrap();
        assert_eq!(plane.to_string(), "Spitfire Mk.IX");
        let parked: TargetType = serde_json::from_str(r#"{"ParkedPlane": "Bf109"}"#).unwrap();
        assert_eq!(parked.to_string(), "ParkedPlane");
    }
}
