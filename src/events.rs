//! Human-readable text for simulation log entries.

use crate::model::{Command, CommandResult, SimulationStep};

/// A title and a one-line argument summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Described {
    pub title: String,
    pub detail: String,
}

impl Described {
    fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

pub fn describe_command(cmd: &Command) -> Described {
    match cmd {
        Command::AddGroundForces(args) => Described::new(
            "Add ground forces",
            format!("In {}, for {}: {}", args.region, args.coalition, args.amount),
        ),
        Command::DestroyGroundForces(args) => Described::new(
            "Destroy ground forces",
            format!("In {}, for {}: {}", args.region, args.coalition, args.amount),
        ),
        Command::MoveGroundForces(args) => Described::new(
            "Move ground forces",
            format!(
                "From {} into {}, for {}: {}",
                args.start, args.destination, args.coalition, args.amount
            ),
        ),
        Command::DamageBuildingPart(args) => Described::new(
            "Damage building",
            format!(
                "At {}, {}, part {}: {}",
                args.building_at.position.x, args.building_at.position.y, args.part, args.damage
            ),
        ),
        Command::RepairBuildingPart(args) => Described::new(
            "Repair building",
            format!(
                "At {}, {}, part {}: {}",
                args.building_at.position.x, args.building_at.position.y, args.part, args.repair
            ),
        ),
        Command::AddPlane(args) => Described::new(
            "Add plane",
            format!("From {}, plane {}: {}", args.airfield, args.plane, args.amount),
        ),
        Command::RemovePlane(args) => Described::new(
            "Remove plane",
            format!("From {}, plane {}: {}", args.airfield, args.plane, args.amount),
        ),
        Command::SetRegionOwner(args) => Described::new(
            "Take over region",
            format!("{} by {}", args.region, args.coalition),
        ),
        Command::AdvanceTime(args) => {
            Described::new("Advance time", format!("Hours: {}", args.hours))
        }
        Command::Other { verb, .. } => Described::new(verb.as_str(), ""),
    }
}

pub fn describe_result(result: &CommandResult) -> Described {
    match result {
        CommandResult::RegionOwnerSet(values) => Described::new(
            "Region owner set",
            format!("{} now owned by {}", values.region, values.coalition),
        ),
        CommandResult::TimeSet(values) => {
            Described::new("Time has been set", format!("Time: {}", values.date_time))
        }
        CommandResult::UpdatedGroundForces(values) => Described::new(
            "Ground forces amount changed",
            format!(
                "{} in {} now has {}",
                values.coalition, values.region, values.forces
            ),
        ),
        CommandResult::UpdatedPlanesAtAirfield(values) => {
            let mut planes: Vec<_> = values.planes.iter().collect();
            planes.sort_by(|a, b| a.0.cmp(b.0));
            let detail = planes
                .iter()
                .map(|(model, count)| format!("{}: {}", model, count))
                .collect::<Vec<_>>()
                .join(", ");
            Described::new("Planes at airfield changed", detail)
        }
        CommandResult::UpdatedStorageValue(values) => Described::new(
            "Storage capacity updated",
            format!(
                "At {}, {}: {}",
                values.building_at.position.x, values.building_at.position.y, values.amount
            ),
        ),
        CommandResult::Other { change, .. } => Described::new(change.as_str(), ""),
    }
}

/// One line in a day's event list, with the details shown when it is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub description: String,
    pub commands: Vec<Described>,
    pub results: Vec<Described>,
}

impl From<&SimulationStep> for EventEntry {
    fn from(step: &SimulationStep) -> Self {
        Self {
            description: step.description.clone(),
            commands: step.commands.iter().map(describe_command).collect(),
            results: step.results.iter().map(describe_result).collect(),
        }
    }
}

pub fn event_list(steps: &[SimulationStep]) -> Vec<EventEntry> {
    steps.iter().map(EventEntry::from).collect()
}
