use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::layout::{assign_locations, LayoutError, Stop};
use crate::locator::{lit_indices, locate_all, LocatedVehicle, Vehicle};

/// Everything one poll produces, built fresh each time.
#[derive(Debug, Clone, Serialize)]
pub struct Cycle {
    pub output_width: usize,
    pub stops: Vec<Stop>,
    pub vehicles: Vec<LocatedVehicle>,
    pub lit: BTreeSet<usize>,
}

pub fn run_cycle(stops: Vec<Stop>, vehicles: Vec<Vehicle>, output_width: usize) -> Result<Cycle, LayoutError> {
    let stops = assign_locations(stops, output_width)?;
    let vehicles = locate_all(vehicles, &stops);
    let lit = lit_indices(&vehicles);
    Ok(Cycle {
        output_width,
        stops,
        vehicles,
        lit,
    })
}

/// A finished cycle as served by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub route: String,
    #[serde(flatten)]
    pub cycle: Cycle,
}

impl Snapshot {
    pub fn new(route: impl Into<String>, cycle: Cycle) -> Self {
        Self {
            taken_at: Utc::now(),
            route: route.into(),
            cycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn stops() -> Vec<Stop> {
        (0..4)
            .map(|i| {
                Stop::new(
                    format!("place-{}", i),
                    format!("Stop {}", i),
                    Coordinate::new(42.30 + i as f64 * 0.01, -71.06),
                    i,
                )
            })
            .collect()
    }

    #[test]
    fn composes_layout_and_locator() {
        let vehicles = vec![
            Vehicle::new("1400", Coordinate::new(42.32, -71.06)),
            Vehicle::new("1401", Coordinate::new(42.317, -71.06)),
        ];
        let cycle = run_cycle(stops(), vehicles, 40).unwrap();
        let indices: Vec<_> = cycle.stops.iter().map(|s| s.assigned_index).collect();
        assert_eq!(indices, vec![0, 10, 20, 30]);
        assert_eq!(cycle.vehicles[0].assigned_index, 20);
        assert_eq!(cycle.vehicles[1].assigned_index, 21);
        assert_eq!(cycle.lit.into_iter().collect::<Vec<_>>(), vec![20, 21]);
    }

    #[test]
    fn no_vehicles_lights_nothing() {
        let cycle = run_cycle(stops(), Vec::new(), 40).unwrap();
        assert!(cycle.lit.is_empty());
    }

    #[test]
    fn layout_errors_propagate() {
        assert_eq!(
            run_cycle(Vec::new(), Vec::new(), 40).unwrap_err(),
            LayoutError::EmptyStopSet
        );
        assert_eq!(
            run_cycle(stops(), Vec::new(), 0).unwrap_err(),
            LayoutError::InvalidOutputWidth(0)
        );
    }

    #[test]
    fn snapshot_json() {
        let cycle = run_cycle(stops(), vec![Vehicle::new("1400", Coordinate::new(42.30, -71.06))], 40).unwrap();
        let json = serde_json::to_value(Snapshot::new("Orange", cycle)).unwrap();
        assert_eq!(json["route"], "Orange");
        assert_eq!(json["output_width"], 40);
        assert_eq!(json["lit"], serde_json::json!([0]));
        assert_eq!(json["vehicles"][0]["id"], "1400");
        assert_eq!(json["vehicles"][0]["assigned_index"], 0);
        assert_eq!(json["stops"][3]["assigned_index"], 30);
    }
}
