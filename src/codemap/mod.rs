//! Importing execution traces ("code maps") recorded by emulators
//!
//! A code map tells us which addresses were executed during a run of the
//! program. Two binary layouts are recognised by their size; anything else is
//! read as a text log, whose format is told apart by its first non-blank line.

mod error;
mod format;

pub use error::{Error, Result};
pub use format::CodeMapFormat;

use crate::arch::Decoder;
use crate::memory::Image;
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Size of a bitmap code map: one bit for every address.
pub const BITMAP_SIZE: u64 = 8192;

/// Size of an occupancy code map: one byte for every address.
pub const OCCUPANCY_SIZE: u64 = 65536;

/// A run of memory observed to hold executed code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    start: u32,
    length: u32,
}

impl CodeBlock {
    pub fn new(start: u32, length: u32) -> Self {
        CodeBlock { start, length }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    fn extend_to(&mut self, end: u32) {
        if end > self.end() {
            self.length = end - self.start;
        }
    }
}

/// Read the set of executed addresses within `[start, end)` from a code map.
///
/// If `format` is not given, it is determined from the file's size and, for
/// text logs, its first non-blank line.
pub fn read_addresses(
    path: &Path,
    start: u32,
    end: u32,
    format: Option<CodeMapFormat>,
) -> Result<BTreeSet<u32>> {
    let size = fs::metadata(path)
        .map_err(|e| Error::source_error(path, e))?
        .len();

    let format = format.or_else(|| match size {
        BITMAP_SIZE => Some(CodeMapFormat::Bitmap),
        OCCUPANCY_SIZE => Some(CodeMapFormat::Occupancy),
        _ => None,
    });

    if let Some(format) = format {
        if format.is_binary() {
            let data = fs::read(path).map_err(|e| Error::source_error(path, e))?;
            log::info!("Reading {} code map {}", format, path.display());

            return Ok(match format {
                CodeMapFormat::Bitmap => parse_bitmap(&data, start, end),
                _ => parse_occupancy(&data, start, end),
            });
        }
    }

    let file = fs::File::open(path).map_err(|e| Error::source_error(path, e))?;

    parse_log(BufReader::new(file), path, size, start, end, format)
}

/// Decode a bitmap code map.
///
/// Bit `n & 7` of byte `n >> 3` is set if address `n` was executed.
pub fn parse_bitmap(data: &[u8], start: u32, end: u32) -> BTreeSet<u32> {
    (start..end)
        .filter(|addr| {
            data.get((*addr >> 3) as usize)
                .map_or(false, |byte| byte & (1 << (addr & 7)) != 0)
        })
        .collect()
}

/// Decode an occupancy code map.
///
/// Address `n` was executed if bit 0 of byte `n` is set.
pub fn parse_occupancy(data: &[u8], start: u32, end: u32) -> BTreeSet<u32> {
    (start..end)
        .filter(|addr| data.get(*addr as usize).map_or(false, |byte| byte & 1 != 0))
        .collect()
}

/// Read the executed addresses out of a text log.
///
/// `size` is the length of the log in bytes, used only to report progress.
/// Blank lines are skipped. Addresses outside `[start, end)` are dropped. A
/// log with nothing but blank lines has no format to detect, and is an error
/// unless `format` was given.
pub fn parse_log<R>(
    reader: R,
    path: &Path,
    size: u64,
    start: u32,
    end: u32,
    format: Option<CodeMapFormat>,
) -> Result<BTreeSet<u32>>
where
    R: BufRead,
{
    let mut format = format;
    let mut addresses = BTreeSet::new();
    let mut read = 0;
    let mut reported = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::source_error(path, e))?;
        read += line.len() as u64 + 1;

        if line.trim().is_empty() {
            continue;
        }

        let log_format = match format {
            Some(log_format) => log_format,
            None => {
                let detected = CodeMapFormat::detect(&line).ok_or_else(|| Error::Format {
                    path: path.to_path_buf(),
                })?;

                log::info!("Reading {} code map {}", detected, path.display());
                format = Some(detected);

                detected
            }
        };

        let addr = log_format.parse_line(&line).ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            token: log_format
                .address_token(&line)
                .unwrap_or_else(|| line.trim())
                .to_string(),
        })?;

        if start <= addr && addr < end {
            addresses.insert(addr);
        }

        if size > 0 {
            let percent = read * 100 / size;
            if percent >= reported + 10 {
                reported = percent - percent % 10;
                log::debug!("{}: {}%", path.display(), reported);
            }
        }
    }

    if format.is_none() {
        return Err(Error::Format {
            path: path.to_path_buf(),
        });
    }

    Ok(addresses)
}

/// Read a text log held in memory.
pub fn parse_log_str(
    text: &str,
    path: &Path,
    start: u32,
    end: u32,
    format: Option<CodeMapFormat>,
) -> Result<BTreeSet<u32>> {
    parse_log(Cursor::new(text), path, text.len() as u64, start, end, format)
}

/// Merge executed addresses into contiguous blocks of code.
///
/// One instruction is decoded at each address; an address falling within or
/// immediately after the current block extends it. No block extends past
/// `end`.
pub fn code_blocks<D>(
    image: &Image,
    decoder: &D,
    addresses: &BTreeSet<u32>,
    end: u32,
) -> Vec<CodeBlock>
where
    D: Decoder,
{
    let mut blocks: Vec<CodeBlock> = Vec::new();

    for addr in addresses.iter().copied().filter(|addr| *addr < end) {
        let instr_end = decoder.decode(image, addr, end).end();

        match blocks.last_mut() {
            Some(block) if addr <= block.end() => block.extend_to(instr_end),
            _ => blocks.push(CodeBlock::new(addr, instr_end - addr)),
        }
    }

    log::debug!(
        "Found {} code blocks in {} addresses",
        blocks.len(),
        addresses.len()
    );

    blocks
}
