use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::api::DEFAULT_API_URL;
use crate::display::{Color, DEFAULT_SPI_DEVICE};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "train-lights",
    author,
    version,
    about = "Show live train positions on an LED strip",
    long_about = "Polls the MBTA v3 API for the stops and vehicles of a route, places each \
                  train on the stop it is nearest to, and lights the matching pixel of a \
                  WS2812 strip. Without a writable SPI device the strip is mocked and each \
                  frame is logged as text."
)]
pub struct Config {
    /// Base URL of the agency API
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API key sent as X-API-Key
    #[arg(long, env = "MBTA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Route to show
    #[arg(short, long, default_value = "Orange")]
    pub route: String,

    /// Number of pixels on the strip
    #[arg(short, long, default_value_t = 40, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Seconds between polls
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Seconds before an API request is abandoned
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Colour of a pixel with a train on it, as r,g,b
    #[arg(long, default_value = "20,2,0", value_parser = parse_color)]
    pub on_color: Color,

    /// Colour of an empty pixel, as r,g,b
    #[arg(long, default_value = "0,0,0", value_parser = parse_color)]
    pub off_color: Color,

    /// spidev node the strip's data line is wired to
    #[arg(long, default_value = DEFAULT_SPI_DEVICE)]
    pub spi_device: PathBuf,

    /// Always use the textual strip
    #[arg(long)]
    pub mock: bool,

    /// Serve the latest frame as JSON on this address
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Also append log records to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn output_width(&self) -> usize {
        self.width as usize
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn parse_color(s: &str) -> Result<Color, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected r,g,b but got '{}'", s));
    };
    let channel = |c: &str| c.parse::<u8>().map_err(|e| format!("bad channel '{}': {}", c, e));
    Ok(Color::new(channel(*r)?, channel(*g)?, channel(*b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["train-lights"]).unwrap();
        assert_eq!(config.api_url, "https://api-v3.mbta.com/");
        assert_eq!(config.route, "Orange");
        assert_eq!(config.output_width(), 40);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.on_color, Color::new(20, 2, 0));
        assert_eq!(config.off_color, Color::new(0, 0, 0));
        assert_eq!(config.spi_device, PathBuf::from("/dev/spidev0.0"));
        assert!(!config.mock);
        assert!(config.listen.is_none());
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "train-lights",
            "--route",
            "Red",
            "--width",
            "72",
            "--on-color",
            "255, 0, 0",
            "--mock",
            "--listen",
            "127.0.0.1:3030",
        ])
        .unwrap();
        assert_eq!(config.route, "Red");
        assert_eq!(config.output_width(), 72);
        assert_eq!(config.on_color, Color::new(255, 0, 0));
        assert!(config.mock);
        assert_eq!(config.listen, Some("127.0.0.1:3030".parse().unwrap()));
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(Config::try_parse_from(["train-lights", "--width", "0"]).is_err());
        assert!(Config::try_parse_from(["train-lights", "--interval", "0"]).is_err());
        assert!(Config::try_parse_from(["train-lights", "--timeout", "0"]).is_err());
    }

    #[test]
    fn colors() {
        assert_eq!(parse_color("1,2,3"), Ok(Color::new(1, 2, 3)));
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("1,2,300").is_err());
        assert!(parse_color("red").is_err());
    }
}
