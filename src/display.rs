//! Output devices: a WS2812 strip driven over SPI, or a textual stand-in.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use smart_leds::SmartLedsWrite;
use spidev::{SpiModeFlags, Spidev, SpidevOptions};
use thiserror::Error;

pub use smart_leds::RGB8 as Color;

pub const DEFAULT_SPI_DEVICE: &str = "/dev/spidev0.0";

/// Three SPI bits per WS2812 bit at this clock give 1.25µs per data bit.
pub const SPI_SPEED_HZ: u32 = 2_400_000;

/// Low time after a frame so the strip latches, 84 bytes is ~280µs at 2.4MHz.
const RESET_BYTES: usize = 84;

/// spidev rejects transfers larger than its `bufsiz` module parameter.
pub const SPIDEV_BUFSIZ: usize = 4096;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("could not write to {}: {source}", device.display())]
    Io {
        device: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A linear array of pixels.
pub trait PixelStrip: Send {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Out of range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Color);

    fn pixels(&self) -> &[Color];

    /// Push the buffered colours out to the device.
    fn flush(&mut self) -> Result<(), DisplayError>;
}

/// `O` for every lit pixel, `-` for every dark one.
pub fn render_ascii(pixels: &[Color]) -> String {
    pixels
        .iter()
        .map(|p| if *p == Color::default() { '-' } else { 'O' })
        .collect()
}

/// Light exactly the pixels in `lit`, switching every other one off.
pub fn paint(strip: &mut dyn PixelStrip, lit: &BTreeSet<usize>, on: Color, off: Color) {
    for index in 0..strip.len() {
        let color = if lit.contains(&index) { on } else { off };
        strip.set_pixel(index, color);
    }
    for index in lit.range(strip.len()..) {
        log::warn!("Pixel {} is past the end of a {} pixel strip", index, strip.len());
    }
}

/// Pick the SPI strip when `device` can be opened and configured, otherwise
/// fall back to the textual mock.
pub fn detect(width: usize, device: &Path, force_mock: bool) -> Box<dyn PixelStrip> {
    if force_mock {
        log::info!("Mocking lights.");
        return Box::new(MockStrip::new(width));
    }

    match SpiStrip::open(width, device) {
        Ok(strip) => {
            log::info!("Driving {} pixels on {}", width, device.display());
            Box::new(strip)
        }
        Err(e) => {
            log::info!("Mocking lights. ({})", e);
            Box::new(MockStrip::new(width))
        }
    }
}

/// In-memory strip that logs each frame as text.
#[derive(Debug, Clone)]
pub struct MockStrip {
    pixels: Vec<Color>,
    last_frame: Option<String>,
}

impl MockStrip {
    pub fn new(width: usize) -> Self {
        Self {
            pixels: vec![Color::default(); width],
            last_frame: None,
        }
    }

    pub fn last_frame(&self) -> Option<&str> {
        self.last_frame.as_deref()
    }
}

impl PixelStrip for MockStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let frame = render_ascii(&self.pixels);
        log::info!("{}", frame);
        self.last_frame = Some(frame);
        Ok(())
    }
}

/// Encodes WS2812 data as an SPI bit stream clocked at 2.4MHz: every data
/// bit becomes three SPI bits, `110` for a one and `100` for a zero.
///
/// A frame is written in transfers of at most `max_transfer` bytes. The data
/// line idles low between them for far less than the reset time, so the strip
/// does not latch mid-frame.
pub struct Ws2812Spi<W> {
    writer: W,
    buffer: Vec<u8>,
    max_transfer: usize,
}

impl<W: Write> Ws2812Spi<W> {
    pub fn new(writer: W) -> Self {
        Self::with_max_transfer(writer, SPIDEV_BUFSIZ)
    }

    pub fn with_max_transfer(writer: W, max_transfer: usize) -> Self {
        Self {
            writer,
            buffer: Vec::new(),
            max_transfer: max_transfer.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn encode_byte(byte: u8) -> [u8; 3] {
    let mut bits: u32 = 0;
    for i in (0..8).rev() {
        bits <<= 3;
        bits |= if (byte >> i) & 1 == 1 { 0b110 } else { 0b100 };
    }
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}

impl<W: Write> SmartLedsWrite for Ws2812Spi<W> {
    type Error = io::Error;
    type Color = Color;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.buffer.clear();
        for item in iterator {
            let color: Color = item.into();
            // Wire order is green, red, blue.
            for byte in [color.g, color.r, color.b] {
                self.buffer.extend_from_slice(&encode_byte(byte));
            }
        }
        self.buffer.extend(std::iter::repeat(0).take(RESET_BYTES));
        for transfer in self.buffer.chunks(self.max_transfer) {
            self.writer.write_all(transfer)?;
        }
        self.writer.flush()
    }
}

/// WS2812 strip on a Linux spidev node, clocked at [`SPI_SPEED_HZ`].
pub struct SpiStrip {
    device: PathBuf,
    driver: Ws2812Spi<Spidev>,
    pixels: Vec<Color>,
}

impl SpiStrip {
    pub fn open(width: usize, device: &Path) -> Result<Self, DisplayError> {
        let io_error = |source| DisplayError::Io {
            device: device.to_path_buf(),
            source,
        };

        let mut spi = Spidev::open(device).map_err(io_error)?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_SPEED_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options).map_err(io_error)?;

        Ok(Self {
            device: device.to_path_buf(),
            driver: Ws2812Spi::new(spi),
            pixels: vec![Color::default(); width],
        })
    }
}

impl PixelStrip for SpiStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        log::info!("{}", render_ascii(&self.pixels));
        self.driver
            .write(self.pixels.iter().copied())
            .map_err(|source| DisplayError::Io {
                device: self.device.clone(),
                source,
            })
    }
}
