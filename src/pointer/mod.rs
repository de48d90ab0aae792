//! Pointer identity across an archive pass.
//!
//! Each call to [`serialize`](crate::serialize) or
//! [`deserialize`](crate::deserialize) owns one set of these registries; they
//! start empty and are dropped when the call returns.
//!
//! - [`PointerIdRegistry`]: address -> id while encoding.
//! - [`PointerAddrRegistry`]: id -> reconstructed handle while decoding.
//! - [`RangeRegistry`]: address ranges of archived allocations, used to map
//!   an [`Interior`] pointer back to its owning block.
//! - [`FreeVerifier`]: releases each replaced allocation at most once when
//!   decoding into an existing value.

// -----------------------------------------------------------------------------
// Modules

mod free;
mod interior;
mod range;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use free::FreeVerifier;
pub use interior::Interior;
pub use range::RangeRegistry;
pub use registry::{Allocation, PointerAddrRegistry, PointerIdRegistry};

pub(crate) use interior::PendingInterior;

// -----------------------------------------------------------------------------
// PointerTag

/// The byte that opens every pointer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointerTag {
    /// No pointee.
    Null = 0,
    /// First sighting, the pointee payload follows.
    New = 1,
    /// Back-reference, an 8-byte id follows.
    Reuse = 2,
}

impl PointerTag {
    /// Panics on an unknown tag: the stream was written for another schema.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => PointerTag::Null,
            1 => PointerTag::New,
            2 => PointerTag::Reuse,
            _ => panic!("unknown pointer tag {byte}"),
        }
    }
}

/// Address of a pointee, used as its identity while encoding.
#[inline]
pub(crate) fn address_of<T: ?Sized>(ptr: *const T) -> usize {
    ptr.cast::<()>() as usize
}
