use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;

use crate::codec::Scalar;
use crate::pointer::{Allocation, FreeVerifier, PendingInterior, PointerAddrRegistry, PointerTag};
use crate::poly::FamilyCache;
use crate::{ArchiveConfig, CorruptedData, DuplicateKeys, Result};

// -----------------------------------------------------------------------------
// Decoder

/// Backward half of the archiver, reading one payload.
///
/// Running out of bytes or meeting an invalid scalar is reported as
/// [`CorruptedData`]. Pointer-structure mismatches (unknown tags, back
/// references to ids never seen) panic: they mean the payload was written
/// for a different type.
pub struct Decoder<'a> {
    src: &'a [u8],
    pos: usize,
    config: ArchiveConfig,
    arena: PointerAddrRegistry,
    interiors: Vec<Box<dyn PendingInterior>>,
    free: Option<FreeVerifier>,
    pub(crate) families: FamilyCache,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(src: &'a [u8], config: ArchiveConfig) -> Self {
        Self {
            src,
            pos: 0,
            config,
            arena: PointerAddrRegistry::new(),
            interiors: Vec::new(),
            free: None,
            families: FamilyCache::new(),
        }
    }

    /// Routes replaced allocations through a [`FreeVerifier`].
    pub(crate) fn with_free_verifier(mut self) -> Self {
        self.free = Some(FreeVerifier::new());
        self
    }

    #[inline]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.src.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(CorruptedData::UnexpectedEof {
                needed: len,
                available,
            });
        }
        let bytes = &self.src[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    pub fn read_scalar<S: Scalar>(&mut self) -> Result<S> {
        self.read_bytes(S::WIDTH).map(S::load)
    }

    /// Reads an 8-byte container length.
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_scalar::<u64>()?;
        usize::try_from(len).map_err(|_| CorruptedData::InvalidValue { what: "length" })
    }

    /// Reads a pointer tag.
    ///
    /// # Panics
    /// On a byte that is not a tag.
    #[inline]
    pub fn read_tag(&mut self) -> Result<PointerTag> {
        self.read_scalar::<u8>().map(PointerTag::from_byte)
    }

    /// How many elements to reserve before decoding `count` of them.
    ///
    /// Capped by the configured limit and by the bytes left, since every
    /// non-empty element takes at least one byte.
    #[inline]
    pub fn reserve_hint(&self, count: usize) -> usize {
        count.min(self.config.reserve_limit).min(self.remaining())
    }

    /// Applies the duplicate-key policy to a key a container refused.
    pub fn duplicate_key(&self) -> Result<()> {
        match self.config.duplicate_keys {
            DuplicateKeys::Lenient => {
                log::warn!("dropping duplicate key ending at payload byte {}", self.pos);
                Ok(())
            }
            DuplicateKeys::Reject => Err(CorruptedData::DuplicateKey),
        }
    }

    // -------------------------------------------------------------------------
    // Pointers

    /// Reads a shared or polymorphic pointer.
    ///
    /// `NULL` yields `None`; `REUSE` clones the handle stored for its id;
    /// `NEW` reserves the next id, runs `body` and stores its result.
    ///
    /// # Panics
    /// If a `REUSE` id is unknown, still being decoded, or holds another
    /// handle type than `P`.
    pub fn read_nullable<P: Clone + 'static>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<P>,
    ) -> Result<Option<P>> {
        self.read_pointer(body, Allocation::cloned::<P>, Allocation::of::<P>)
    }

    /// As [`read_nullable`](Self::read_nullable) for pointers that cannot be null.
    ///
    /// # Panics
    /// On a `NULL` tag.
    pub fn read_shared<P: Clone + 'static>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<P>,
    ) -> Result<P> {
        self.read_shared_with(body, Allocation::cloned::<P>)
    }

    /// As [`read_shared`](Self::read_shared), with `adopt` turning an
    /// allocation first rebuilt through another pointer type into a `P`.
    pub(crate) fn read_shared_with<P: Clone + 'static>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<P>,
        adopt: impl FnOnce(&Allocation) -> Option<P>,
    ) -> Result<P> {
        match self.read_pointer(body, adopt, Allocation::of::<P>)? {
            Some(handle) => Ok(handle),
            None => panic!("NULL tag for a non-nullable pointer"),
        }
    }

    /// The pointer protocol: `adopt` serves a `REUSE` from the stored
    /// allocation, `store` records the result of `body` after a `NEW`.
    pub(crate) fn read_pointer<P>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<P>,
        adopt: impl FnOnce(&Allocation) -> Option<P>,
        store: impl FnOnce(&P) -> Allocation,
    ) -> Result<Option<P>> {
        match self.read_tag()? {
            PointerTag::Null => Ok(None),
            PointerTag::Reuse => {
                let id = self.read_scalar::<u64>()?;
                Ok(Some(self.arena.adopt(id, adopt)))
            }
            PointerTag::New => {
                let id = self.arena.reserve();
                let handle = body(self)?;
                self.arena.fill(id, store(&handle));
                Ok(Some(handle))
            }
        }
    }

    /// Reads a uniquely owned allocation, which is always tagged `NEW`.
    ///
    /// # Panics
    /// On any other tag.
    pub fn read_unique<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let tag = self.read_tag()?;
        assert!(tag == PointerTag::New, "{tag:?} tag for a uniquely owned pointer");
        let id = self.arena.reserve();
        let value = body(self)?;
        self.arena.fill(id, Allocation::new(Box::new(())));
        Ok(value)
    }

    /// Gives up `owner`, the previous handle for the allocation at `addr`.
    ///
    /// With a free verifier the first owner of each address is kept until
    /// the pass ends; other owners only drop their share here.
    pub(crate) fn retire<P: 'static>(&mut self, addr: usize, owner: P) {
        if let Some(verifier) = &mut self.free
            && verifier.is_freeable(addr)
        {
            verifier.release(addr, Box::new(owner));
        }
    }

    pub(crate) fn defer_interior(&mut self, interior: Box<dyn PendingInterior>) {
        self.interiors.push(interior);
    }

    /// Number of allocations rebuilt so far.
    #[inline]
    pub fn allocations(&self) -> usize {
        self.arena.len()
    }

    // -------------------------------------------------------------------------
    // Passes

    /// Reads the finalize block, binds every deferred interior pointer and
    /// checks the payload was consumed exactly.
    pub(crate) fn finish(&mut self) -> Result<()> {
        let interiors = mem::take(&mut self.interiors);
        for interior in &interiors {
            let id = self.read_scalar::<u64>()?;
            let offset = self.read_len()?;
            interior.bind(self.arena.allocation(id), offset);
        }

        let remaining = self.remaining();
        if remaining != 0 {
            return Err(CorruptedData::TrailingBytes { remaining });
        }

        if let Some(verifier) = self.free.take() {
            let released = verifier.finish();
            log::debug!("decode in place released {released} allocations");
        }

        log::debug!(
            "decoded {} bytes, {} allocations, {} interior pointers",
            self.pos,
            self.arena.len(),
            interiors.len(),
        );
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
