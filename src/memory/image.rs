//! Flat 64K program images.

use std::ops::Range;

/// Size of the Z80 address space.
pub const ADDRESS_SPACE: usize = 0x10000;

/// Size of a 48K SNA snapshot: a 27-byte register header followed by RAM.
pub const SNA_48K_SIZE: usize = 49179;

const SNA_HEADER_SIZE: usize = 27;
const SNA_RAM_BASE: usize = 0x4000;

/// An Image is the contents of the whole address space as the program under
/// analysis would see it.
///
/// Banked (128K) memory must already be mapped into this flat view before
/// classification begins; the image never changes while it is being
/// classified.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
}

impl Default for Image {
    fn default() -> Self {
        Image {
            data: vec![0; ADDRESS_SPACE],
        }
    }
}

impl Image {
    /// Place a raw binary at `org`, zero filling the rest of memory.
    ///
    /// Yields `None` if the binary does not fit below the top of memory.
    pub fn from_raw(data: &[u8], org: u32) -> Option<Self> {
        let org = org as usize;
        let end = org.checked_add(data.len())?;
        if end > ADDRESS_SPACE {
            return None;
        }

        let mut image = Image::default();
        image.data[org..end].copy_from_slice(data);

        Some(image)
    }

    /// Load a 48K SNA snapshot, discarding its register header.
    pub fn from_sna(data: &[u8]) -> Option<Self> {
        if data.len() != SNA_48K_SIZE {
            return None;
        }

        Self::from_raw(&data[SNA_HEADER_SIZE..], SNA_RAM_BASE as u32)
    }

    /// The address range occupied by the RAM of a 48K snapshot.
    pub fn sna_range() -> Range<u32> {
        SNA_RAM_BASE as u32..ADDRESS_SPACE as u32
    }

    /// Read a single byte. Addresses beyond the top of memory read as zero.
    pub fn read(&self, addr: u32) -> u8 {
        self.data.get(addr as usize).copied().unwrap_or(0)
    }

    /// Borrow the bytes in `[start, end)`, clamped to the address space.
    pub fn slice(&self, start: u32, end: u32) -> &[u8] {
        let end = (end as usize).min(self.data.len());
        let start = (start as usize).min(end);

        &self.data[start..end]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
