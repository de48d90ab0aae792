use alloc::collections::BTreeMap;

// -----------------------------------------------------------------------------
// RangeRegistry

/// Byte ranges of the allocations archived so far in a pass.
///
/// Lookups take the nearest base at or below an address, then check the
/// address lies inside that range. Zero-sized allocations are treated as one
/// byte long so their own base still resolves.
#[derive(Default, Debug)]
pub struct RangeRegistry {
    ranges: BTreeMap<usize, usize>,
}

impl RangeRegistry {
    pub const fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, base: usize, len: usize) {
        self.ranges.insert(base, len.max(1));
    }

    /// The `(base, len)` range holding `addr`, if any.
    pub fn find(&self, addr: usize) -> Option<(usize, usize)> {
        let (&base, &len) = self.ranges.range(..=addr).next_back()?;
        (addr - base < len).then_some((base, len))
    }

    /// Base address of the allocation holding `addr`.
    ///
    /// # Panics
    /// If `addr` lies outside every registered range.
    pub fn get_head(&self, addr: usize) -> usize {
        match self.find(addr) {
            Some((base, _)) => base,
            None => panic!("interior pointer {addr:#x} lies outside every archived allocation"),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

// -----------------------------------------------------------------------------
// Tests
