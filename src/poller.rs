//! The fixed-interval poll loop and the route poller it drives.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;

use crate::api::ApiClient;
use crate::config::Config;
use crate::display::{paint, DisplayError, PixelStrip};
use crate::pipeline::{run_cycle, Snapshot};
use crate::server::SharedSnapshot;

/// One unit of work per tick.
#[allow(async_fn_in_trait)]
pub trait Poller {
    async fn poll(&mut self) -> Result<()>;
}

/// Tick every `interval` until `shutdown` resolves, which also cancels a
/// cycle that is still in flight. A failed cycle is logged and skipped.
/// Returns the number of cycles that ran to completion.
pub async fn run_loop<S, P>(interval: Duration, shutdown: S, poller: &mut P) -> usize
where
    S: Future,
    P: Poller,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                log::info!("Abandoning cycle in flight");
                break;
            }
            result = poller.poll() => {
                completed += 1;
                if let Err(e) = result {
                    log::error!("Skipping cycle: {:#}", e);
                }
            }
        }
    }

    log::info!("Shutting down");
    completed
}

/// Fetches a route, places its trains and paints the strip.
pub struct RoutePoller {
    config: Config,
    client: ApiClient,
    strip: Box<dyn PixelStrip>,
    snapshot: SharedSnapshot,
}

impl RoutePoller {
    pub fn new(config: Config, client: ApiClient, strip: Box<dyn PixelStrip>, snapshot: SharedSnapshot) -> Self {
        Self {
            config,
            client,
            strip,
            snapshot,
        }
    }

    /// Turn every pixel off.
    pub fn switch_off(&mut self) -> Result<(), DisplayError> {
        let off = self.config.off_color;
        paint(self.strip.as_mut(), &Default::default(), off, off);
        self.strip.flush()
    }
}

impl Poller for RoutePoller {
    async fn poll(&mut self) -> Result<()> {
        let route = &self.config.route;
        log::info!("getting stops and trains...");
        let (stops, vehicles) = tokio::try_join!(
            self.client.fetch_stops(route),
            self.client.fetch_vehicles(route),
        )
        .context("API request failed")?;
        log::info!("retrieved {} stops and {} trains", stops.len(), vehicles.len());

        let cycle = run_cycle(stops, vehicles, self.config.output_width())?;
        for stop in &cycle.stops {
            log::debug!("{} -> pixel {}", stop.name, stop.assigned_index);
        }
        for located in &cycle.vehicles {
            log::info!(
                "train {} ({:?}, {}) -> pixel {}",
                located.vehicle.id,
                located.vehicle.direction,
                located.vehicle.status,
                located.assigned_index
            );
        }

        paint(self.strip.as_mut(), &cycle.lit, self.config.on_color, self.config.off_color);
        self.strip.flush()?;

        *self.snapshot.write().await = Some(Snapshot::new(route.clone(), cycle));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Starts a cycle that never finishes.
    struct Hanging {
        started: Arc<Notify>,
    }

    impl Poller for Hanging {
        async fn poll(&mut self) -> Result<()> {
            self.started.notify_one();
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    struct Counting {
        cycles: usize,
        fail: bool,
        stop_after: usize,
        done: Arc<Notify>,
    }

    impl Poller for Counting {
        async fn poll(&mut self) -> Result<()> {
            self.cycles += 1;
            if self.cycles == self.stop_after {
                self.done.notify_one();
            }
            if self.fail {
                anyhow::bail!("agency API unavailable");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_cancels_cycle_in_flight() {
        let started = Arc::new(Notify::new());
        let mut poller = Hanging {
            started: started.clone(),
        };

        let completed = tokio::time::timeout(
            Duration::from_secs(5),
            run_loop(Duration::from_millis(10), async move { started.notified().await }, &mut poller),
        )
        .await
        .expect("loop kept running after shutdown");
        assert_eq!(completed, 0);
    }

    #[tokio::test]
    async fn failed_cycles_keep_the_loop_going() {
        let done = Arc::new(Notify::new());
        let mut poller = Counting {
            cycles: 0,
            fail: true,
            stop_after: 3,
            done: done.clone(),
        };

        let completed = tokio::time::timeout(
            Duration::from_secs(5),
            run_loop(Duration::from_millis(1), async move { done.notified().await }, &mut poller),
        )
        .await
        .unwrap();
        assert!(completed >= 2);
        assert!(poller.cycles >= 3);
    }

    #[tokio::test]
    async fn shutdown_before_first_tick() {
        let done = Arc::new(Notify::new());
        let mut poller = Counting {
            cycles: 0,
            fail: false,
            stop_after: usize::MAX,
            done,
        };

        let completed = run_loop(Duration::from_millis(1), std::future::ready(()), &mut poller).await;
        assert_eq!(completed, 0);
        assert_eq!(poller.cycles, 0);
    }
}
