//! # train-lights
//!
//! Places the live trains of a transit route onto a strip of LEDs, one pixel
//! range per stop.
//!
//! The core is synchronous and pure:
//!
//! - [`geo::distance_km`] measures how far a train is from a stop;
//! - [`layout::assign_locations`] spreads the route's stops over the strip;
//! - [`locator::locate`] picks the pixel for a train by scanning the stops
//!   in travel order.
//!
//! Around it sit the API client, the pixel strip drivers, the status
//! endpoint and the poll loop.
//!
//! ```
//! use train_lights::prelude::*;
//!
//! let stops = (0..4)
//!     .map(|i| Stop::new(format!("s{}", i), format!("Stop {}", i), Coordinate::new(42.30 + i as f64 * 0.01, -71.06), i))
//!     .collect();
//! let train = Vehicle::new("1400", Coordinate::new(42.32, -71.06));
//!
//! let cycle = run_cycle(stops, vec![train], 40).unwrap();
//! assert_eq!(cycle.lit.into_iter().collect::<Vec<_>>(), vec![20]);
//! ```

pub mod api;
pub mod config;
pub mod display;
pub mod geo;
pub mod layout;
pub mod locator;
pub mod logging;
pub mod pipeline;
pub mod poller;
pub mod server;

pub mod prelude {
    pub use crate::geo::{distance_km, Coordinate};
    pub use crate::layout::{assign_locations, LayoutError, Stop};
    pub use crate::locator::{locate, locate_all, Direction, LocatedVehicle, Vehicle};
    pub use crate::pipeline::{run_cycle, Cycle, Snapshot};
}
