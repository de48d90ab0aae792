use alloc::vec::Vec;
use core::mem;

use crate::Archive;
use crate::codec::Scalar;
use crate::pointer::{PointerIdRegistry, PointerTag, RangeRegistry};
use crate::poly::FamilyCache;

// -----------------------------------------------------------------------------
// Sink

enum Sink {
    /// Dry run: only sums widths.
    Count(usize),
    Write(Vec<u8>),
}

// -----------------------------------------------------------------------------
// Encoder

/// Forward half of the archiver.
///
/// An encoder either writes bytes or, in the counting pass, only measures
/// them. Both modes run the same traversal with the same registries, so the
/// count matches the written length exactly.
pub struct Encoder {
    sink: Sink,
    pointers: PointerIdRegistry,
    ranges: RangeRegistry,
    interiors: Vec<usize>,
    pub(crate) families: FamilyCache,
}

impl Encoder {
    pub(crate) fn counting() -> Self {
        Self::with_sink(Sink::Count(0))
    }

    pub(crate) fn writing(buf: Vec<u8>) -> Self {
        Self::with_sink(Sink::Write(buf))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink,
            pointers: PointerIdRegistry::new(),
            ranges: RangeRegistry::new(),
            interiors: Vec::new(),
            families: FamilyCache::new(),
        }
    }

    /// Bytes produced so far.
    #[inline]
    pub fn position(&self) -> usize {
        match &self.sink {
            Sink::Count(len) => *len,
            Sink::Write(buf) => buf.len(),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        match &mut self.sink {
            Sink::Count(len) => *len += bytes.len(),
            Sink::Write(buf) => buf.extend_from_slice(bytes),
        }
    }

    pub fn write_scalar<S: Scalar>(&mut self, value: S) {
        match &mut self.sink {
            Sink::Count(len) => *len += S::WIDTH,
            Sink::Write(buf) => {
                let at = buf.len();
                buf.resize(at + S::WIDTH, 0);
                value.dump(&mut buf[at..]);
            }
        }
    }

    /// Writes a container length as 8 bytes.
    #[inline]
    pub fn write_len(&mut self, len: usize) {
        self.write_scalar(len as u64);
    }

    #[inline]
    pub fn write_tag(&mut self, tag: PointerTag) {
        self.write_scalar(tag as u8);
    }

    // -------------------------------------------------------------------------
    // Pointers

    /// Writes a shared allocation at `addr` spanning `extent` bytes.
    ///
    /// The first sighting is tagged `NEW`, registered, and `body` writes the
    /// pointee. Later sightings are tagged `REUSE` with the id only.
    pub fn write_shared(&mut self, addr: usize, extent: usize, body: impl FnOnce(&mut Self)) {
        if let Some(id) = self.pointers.get(addr) {
            self.write_tag(PointerTag::Reuse);
            self.write_scalar(id);
            return;
        }

        let id = self.pointers.next_id();
        self.pointers.insert(addr, id);
        self.ranges.insert(addr, extent);
        self.write_tag(PointerTag::New);
        body(self);
    }

    /// Writes a uniquely owned allocation: always `NEW`, never registered
    /// for reuse, but it still takes an id so ordinals stay aligned.
    pub fn write_unique(&mut self, body: impl FnOnce(&mut Self)) {
        self.pointers.next_id();
        self.write_tag(PointerTag::New);
        body(self);
    }

    #[inline]
    pub fn write_null(&mut self) {
        self.write_tag(PointerTag::Null);
    }

    /// Queues an interior pointer for the finalize block.
    pub(crate) fn defer_interior(&mut self, addr: usize) {
        self.interiors.push(addr);
    }

    /// Number of allocations given an id so far.
    #[inline]
    pub fn allocations(&self) -> u64 {
        self.pointers.count()
    }

    // -------------------------------------------------------------------------
    // Passes

    /// Encodes `value` followed by the interior finalize block.
    pub(crate) fn run<T: Archive>(&mut self, value: &T) {
        value.encode(self);
        self.finalize();
    }

    /// Appends `(owning id, byte offset)` for each interior pointer, in the
    /// order they were met.
    fn finalize(&mut self) {
        let interiors = mem::take(&mut self.interiors);
        for addr in &interiors {
            let head = self.ranges.get_head(*addr);
            let id = match self.pointers.get(head) {
                Some(id) => id,
                None => panic!("allocation {head:#x} has a range but no id"),
            };
            self.write_scalar(id);
            self.write_len(*addr - head);
        }
        log::trace!("finalize: {} interior pointers", interiors.len());
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        match self.sink {
            Sink::Write(buf) => buf,
            Sink::Count(_) => Vec::new(),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
