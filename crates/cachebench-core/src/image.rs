//! Binary greyscale (PGM `P5`) encoding of Mandelbrot iteration counts.
//!
//! Each count is scaled linearly into `0..=255` against the iteration cap:
//! `pixel = 255 * min(count, cap) / cap`. Non-divergent points carry the
//! count `0` and therefore render black.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Magic token of the binary greyscale format.
pub const PGM_MAGIC: &str = "P5";

/// Largest pixel value written.
pub const PGM_MAX_VALUE: u8 = 255;

/// Scales an iteration count into a pixel intensity.
///
/// A zero cap maps every count to `0`.
#[inline]
#[must_use]
pub fn scale_count(count: u32, max_iterations: u32) -> u8 {
    if max_iterations == 0 {
        return 0;
    }
    let clamped = u64::from(count.min(max_iterations));
    let scaled = clamped * u64::from(PGM_MAX_VALUE) / u64::from(max_iterations);
    // `scaled <= 255` because `clamped <= max_iterations`.
    u8::try_from(scaled).unwrap_or(PGM_MAX_VALUE)
}

/// Writes `counts` (row-major, `width * height`) as a PGM image.
///
/// # Errors
///
/// - [`Error::Image`] if `counts` does not hold `width * height` entries
/// - [`Error::Io`] if the writer fails
pub fn write_pgm<W: Write>(
    mut writer: W,
    width: usize,
    height: usize,
    counts: &[u32],
    max_iterations: u32,
) -> Result<()> {
    if width == 0 || height == 0 || width.checked_mul(height) != Some(counts.len()) {
        return Err(Error::Image(format!(
            "{} counts do not fill a {width}x{height} image",
            counts.len()
        )));
    }

    write!(writer, "{PGM_MAGIC}\n{width} {height}\n{PGM_MAX_VALUE}\n")?;
    let pixels: Vec<u8> = counts
        .iter()
        .map(|&c| scale_count(c, max_iterations))
        .collect();
    writer.write_all(&pixels)?;
    writer.flush()?;
    Ok(())
}

/// Writes the image to `path`, replacing any existing file.
pub fn save_pgm(
    path: impl AsRef<Path>,
    width: usize,
    height: usize,
    counts: &[u32],
    max_iterations: u32,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_pgm(BufWriter::new(file), width, height, counts, max_iterations)?;
    tracing::info!(path = %path.display(), width, height, "Wrote PGM image");
    Ok(())
}

/// A decoded PGM image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmImage {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Declared maximum pixel value.
    pub max_value: u16,
    /// Row-major pixel intensities.
    pub pixels: Vec<u8>,
}

impl PgmImage {
    /// Pixel at `(row, col)`.
    #[must_use]
    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        self.pixels[row * self.width + col]
    }
}

struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while self.bytes.get(self.pos).is_some_and(|&c| c != b'\n') {
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a str> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::Image("truncated PGM header".to_string()));
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| Error::Image("PGM header is not ASCII".to_string()))
    }

    fn number(&mut self, field: &str) -> Result<usize> {
        let token = self.token()?;
        token
            .parse()
            .map_err(|_| Error::Image(format!("invalid PGM {field}: {token:?}")))
    }
}

/// Parses a binary PGM image with an 8-bit maximum value.
///
/// Header tokens may be separated by any whitespace and interleaved with
/// `#` comments; exactly one whitespace byte separates the header from the
/// pixel data.
///
/// # Errors
///
/// Returns [`Error::Image`] for a malformed header or short pixel data, and
/// [`Error::Io`] if the reader fails.
pub fn read_pgm<R: Read>(mut reader: R) -> Result<PgmImage> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut cursor = HeaderCursor {
        bytes: &bytes,
        pos: 0,
    };
    let magic = cursor.token()?;
    if magic != PGM_MAGIC {
        return Err(Error::Image(format!("unsupported magic {magic:?}")));
    }
    let width = cursor.number("width")?;
    let height = cursor.number("height")?;
    let max_value = cursor.number("max value")?;
    if max_value == 0 || max_value > usize::from(PGM_MAX_VALUE) {
        return Err(Error::Image(format!(
            "max value {max_value} outside 1..=255"
        )));
    }
    // Single separator byte before the raster.
    let start = cursor.pos + 1;
    let len = width
        .checked_mul(height)
        .ok_or_else(|| Error::Image("image dimensions overflow".to_string()))?;
    let pixels = bytes
        .get(start..start.saturating_add(len))
        .ok_or_else(|| Error::Image(format!("expected {len} pixels")))?
        .to_vec();

    Ok(PgmImage {
        width,
        height,
        max_value: u16::try_from(max_value).unwrap_or(u16::from(PGM_MAX_VALUE)),
        pixels,
    })
}

/// Reads a PGM image from `path`.
pub fn load_pgm(path: impl AsRef<Path>) -> Result<PgmImage> {
    read_pgm(std::io::BufReader::new(File::open(path)?))
}
