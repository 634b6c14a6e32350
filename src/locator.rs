//! Matches live vehicles to the pixel of the stop they are nearest to.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::geo::{distance_km, Coordinate};
use crate::layout::Stop;

/// A vehicle closer than this to a stop is considered to be at it.
pub const PROXIMITY_THRESHOLD_KM: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    Unknown,
}

impl Direction {
    /// Agency `direction_id`: 1 is northbound, 0 is southbound.
    pub fn from_direction_id(direction_id: Option<u8>) -> Self {
        match direction_id {
            Some(1) => Direction::North,
            Some(0) => Direction::South,
            _ => Direction::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Agency label, usually the lead car number.
    pub id: String,
    pub coordinate: Coordinate,
    pub direction: Direction,
    pub status: String,
    pub stop_sequence: Option<u32>,
    pub bearing: Option<f64>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinate,
            direction: Direction::Unknown,
            status: String::new(),
            stop_sequence: None,
            bearing: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedVehicle {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub assigned_index: usize,
}

/// Pixel for a vehicle, scanning the laid-out stops in travel order.
///
/// A stop within [`PROXIMITY_THRESHOLD_KM`] wins outright. Otherwise the scan
/// walks down the trough of distances, tentatively placing the vehicle one
/// pixel past each stop that is closer than the one before it, and gives up
/// as soon as the distance stops shrinking. Only an empty stop list yields
/// `None`.
pub fn locate(vehicle: &Vehicle, stops: &[Stop]) -> Option<usize> {
    let mut best = None;
    let mut previous_km: Option<f64> = None;

    for stop in stops {
        let km = distance_km(vehicle.coordinate, stop.coordinate);
        if km < PROXIMITY_THRESHOLD_KM {
            log::debug!("{} is at {}", vehicle.id, stop.name);
            return Some(stop.assigned_index);
        }

        match previous_km {
            Some(prev) if km >= prev => break,
            Some(_) => log::debug!("{} is closer to {} ({:.3} km)", vehicle.id, stop.name, km),
            None => log::debug!("{} starts past {}", vehicle.id, stop.name),
        }
        best = Some(stop.assigned_index + 1);
        previous_km = Some(km);
    }

    best
}

/// Locate a batch of vehicles against the same stop layout.
pub fn locate_all(vehicles: Vec<Vehicle>, stops: &[Stop]) -> Vec<LocatedVehicle> {
    vehicles
        .into_iter()
        .filter_map(|vehicle| match locate(&vehicle, stops) {
            Some(assigned_index) => Some(LocatedVehicle {
                vehicle,
                assigned_index,
            }),
            None => {
                log::warn!("No stops to place vehicle {} against", vehicle.id);
                None
            }
        })
        .collect()
}

/// The set of pixels to light for a batch of located vehicles.
pub fn lit_indices(located: &[LocatedVehicle]) -> BTreeSet<usize> {
    located.iter().map(|v| v.assigned_index).collect()
}
