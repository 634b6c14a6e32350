use anyhow::{Context, Result};
use clap::Parser;

use train_lights::api::ApiClient;
use train_lights::config::Config;
use train_lights::display;
use train_lights::logging;
use train_lights::poller::{run_loop, RoutePoller};
use train_lights::server::{self, SharedSnapshot};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(config.verbose, config.log_file.as_deref()).context("Failed to open log file")?;

    log::info!("Showing route {} on {} pixels", config.route, config.output_width());

    let client = ApiClient::new(&config.api_url, config.api_key.clone(), config.request_timeout())?;
    let strip = display::detect(config.output_width(), &config.spi_device, config.mock);
    let snapshot = SharedSnapshot::default();

    if let Some(addr) = config.listen {
        let state = snapshot.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(addr, state).await {
                log::error!("Status endpoint on {} stopped: {}", addr, e);
            }
        });
    }

    let mut poller = RoutePoller::new(config.clone(), client, strip, snapshot);
    run_loop(config.poll_interval(), tokio::signal::ctrl_c(), &mut poller).await;

    poller.switch_off().context("Failed to turn the strip off")?;
    Ok(())
}
