//! Common utilities for the command line

use crate::memory::{Image, ADDRESS_SPACE, SNA_48K_SIZE};
use std::io;
use std::ops::Range;
use std::path::Path;

/// Parse an address given on the command line.
///
/// Addresses are decimal unless prefixed with `0x` or `$`, and may be as
/// high as 65536, the exclusive top of memory.
pub fn parse_address(text: &str) -> Option<u32> {
    let text = text.trim();
    let addr = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix('$')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        text.parse().ok()?
    };

    if addr as usize > ADDRESS_SPACE {
        return None;
    }

    Some(addr)
}

/// Parse an optional address argument, complaining about invalid ones.
pub fn address_arg(name: &str, value: Option<&str>) -> io::Result<Option<u32>> {
    match value {
        Some(text) => parse_address(text).map(Some).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid {} address {}", name, text),
            )
        }),
        None => Ok(None),
    }
}

fn is_snapshot(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("sna"))
}

/// Load an image file, yielding it along with the range of memory it
/// occupies.
///
/// Files named `*.sna` are read as 48K snapshots. Anything else is a raw
/// binary placed at `org`, which defaults to leaving the binary flush against
/// the top of memory.
pub fn load_image(path: &Path, data: &[u8], org: Option<u32>) -> io::Result<(Image, Range<u32>)> {
    if is_snapshot(path) {
        let image = Image::from_sna(data).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} is not a 48K snapshot ({} bytes, expected {})",
                    path.display(),
                    data.len(),
                    SNA_48K_SIZE
                ),
            )
        })?;

        return Ok((image, Image::sna_range()));
    }

    let org = match org {
        Some(org) => org,
        None => ADDRESS_SPACE.saturating_sub(data.len()) as u32,
    };

    let image = Image::from_raw(data, org).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} ({} bytes) does not fit in memory at ${:04X}",
                path.display(),
                data.len(),
                org
            ),
        )
    })?;

    Ok((image, org..org + data.len() as u32))
}

/// Pick the range to classify, preferring explicit bounds to the extent of
/// the image.
pub fn resolve_range(
    image_range: Range<u32>,
    start: Option<u32>,
    end: Option<u32>,
) -> io::Result<Range<u32>> {
    let start = start.unwrap_or(image_range.start);
    let end = end.unwrap_or(image_range.end);

    if start >= end || end as usize > ADDRESS_SPACE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid range ${:04X}-${:04X}", start, end),
        ));
    }

    Ok(start..end)
}
