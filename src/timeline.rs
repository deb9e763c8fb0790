//! Campaign figures over every date, for the graph view and the `timeline`
//! command.

use crate::aggregate::{BuildingMatch, CoalitionSummary, DaySummary};
use crate::client::DataSource;
use crate::model::{Coalition, DateTime, SimulationStep, WarState, World};
use rayon::prelude::*;
use std::fmt::Write;

/// Summary of one campaign day that had both a state and a log.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDay {
    pub day: usize,
    pub date: DateTime,
    pub summary: DaySummary,
}

/// Fetch every day's state and following log. Days where either fetch fails
/// are left out of the timeline.
pub async fn collect(
    source: &dyn DataSource,
    world: &World,
    dates: &[DateTime],
    matching: BuildingMatch,
) -> Vec<TimelineDay> {
    let mut fetched: Vec<(usize, DateTime, WarState, Vec<SimulationStep>)> = Vec::new();
    for (day, date) in dates.iter().enumerate() {
        let (state, steps) = tokio::join!(source.state(day), source.simulation_steps(day + 1));
        match (state, steps) {
            (Ok(state), Ok(steps)) => fetched.push((day, *date, state, steps)),
            (Err(e), _) | (_, Err(e)) => {
                tracing::info!(day, error = %e, "Skipping day in timeline");
            }
        }
    }

    tracing::debug!(days = fetched.len(), of = dates.len(), "Summarizing timeline");
    fetched
        .par_iter()
        .map(|(day, date, state, steps)| TimelineDay {
            day: *day,
            date: *date,
            summary: DaySummary::compute(world, Some(state), Some(steps.as_slice()), matching),
        })
        .collect()
}

/// Plotted quantity and the factor it is scaled by so all series share an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Regions,
    Supplies,
    GroundForces,
    Planes,
    CityStorage,
    AirfieldStorage,
    InFlightLosses,
    ParkedLosses,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Regions,
        Metric::Supplies,
        Metric::GroundForces,
        Metric::Planes,
        Metric::CityStorage,
        Metric::AirfieldStorage,
        Metric::InFlightLosses,
        Metric::ParkedLosses,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Regions => "regions",
            Metric::Supplies => "supplies",
            Metric::GroundForces => "ground forces",
            Metric::Planes => "planes",
            Metric::CityStorage => "city storage",
            Metric::AirfieldStorage => "airfield storage",
            Metric::InFlightLosses => "inflight losses",
            Metric::ParkedLosses => "parked planes losses",
        }
    }

    pub fn scale(self) -> f64 {
        match self {
            Metric::Regions => 100.0,
            Metric::Supplies => 1e-3,
            Metric::GroundForces => 0.1,
            Metric::CityStorage => 1e-4,
            Metric::AirfieldStorage => 1e-3,
            Metric::Planes | Metric::InFlightLosses | Metric::ParkedLosses => 1.0,
        }
    }

    fn scale_suffix(self) -> &'static str {
        match self {
            Metric::Regions => " x100",
            Metric::Supplies | Metric::AirfieldStorage => " /1k",
            Metric::GroundForces => " /10",
            Metric::CityStorage => " /10k",
            _ => "",
        }
    }

    /// Unscaled value.
    pub fn value(self, summary: &CoalitionSummary) -> f64 {
        match self {
            Metric::Regions => summary.regions as f64,
            Metric::Supplies => summary.supplies,
            Metric::GroundForces => summary.ground_forces,
            Metric::Planes => summary.planes,
            Metric::CityStorage => summary.region_storage,
            Metric::AirfieldStorage => summary.airfield_storage,
            Metric::InFlightLosses => summary.losses.shot,
            Metric::ParkedLosses => summary.losses.strafed,
        }
    }

    pub fn label(self, coalition: Coalition) -> String {
        format!("{} ({}){}", self.name(), coalition, self.scale_suffix())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub metric: Metric,
    pub coalition: Coalition,
    pub label: String,
    /// (day index, scaled value)
    pub points: Vec<(f64, f64)>,
}

/// One scaled series per metric and coalition, Axis first as on the graph page.
pub fn series(days: &[TimelineDay]) -> Vec<Series> {
    let mut out = Vec::with_capacity(Metric::ALL.len() * 2);
    for metric in Metric::ALL {
        for coalition in [Coalition::Axis, Coalition::Allies] {
            let points = days
                .iter()
                .map(|d| {
                    let value = metric.value(d.summary.of(coalition)) * metric.scale();
                    (d.day as f64, value)
                })
                .collect();
            out.push(Series {
                metric,
                coalition,
                label: metric.label(coalition),
                points,
            });
        }
    }
    out
}

/// Largest scaled value across all series, for sizing a chart's y axis.
pub fn max_value(series: &[Series]) -> f64 {
    series
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, y)| *y))
        .fold(0.0, f64::max)
}

/// Plain-text table of unscaled figures, one row per day and coalition.
pub fn table(days: &[TimelineDay]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<18} {:<7}", "date", "side");
    for metric in Metric::ALL {
        let _ = write!(out, " {:>12}", short_name(metric));
    }
    out.push('\n');
    for day in days {
        for coalition in Coalition::ALL {
            let _ = write!(out, "{:<18} {:<7}", day.date.to_string(), coalition.as_str());
            for metric in Metric::ALL {
                let _ = write!(out, " {:>12.0}", metric.value(day.summary.of(coalition)));
            }
            out.push('\n');
        }
    }
    out
}

fn short_name(metric: Metric) -> &'static str {
    match metric {
        Metric::Regions => "regions",
        Metric::Supplies => "supplies",
        Metric::GroundForces => "ground",
        Metric::Planes => "planes",
        Metric::CityStorage => "city_store",
        Metric::AirfieldStorage => "af_store",
        Metric::InFlightLosses => "shot",
        Metric::ParkedLosses => "strafed",
    }
}
