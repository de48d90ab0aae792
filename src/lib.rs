#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Extern Self

// Derive output names `::vc_archive`, which must also resolve inside
// this crate's own tests.
extern crate self as vc_archive;

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Hashing

use foldhash::fast::FixedState;

/// Hash state of the per-call registries: `foldhash` with a fixed seed, so
/// no pass depends on process randomness.
pub(crate) const REGISTRY_STATE: FixedState = FixedState::with_seed(0x2D35_8DCC_AA6C_78A5);

// -----------------------------------------------------------------------------
// Modules

mod config;
mod envelope;
mod error;
mod kind;

pub mod archive;
pub mod codec;
pub mod pointer;
pub mod poly;

#[doc(hidden)]
pub mod __macro_exports;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use archive::{Archive, Decoder, Encoder};
pub use config::{ArchiveConfig, DuplicateKeys};
pub use envelope::{HEADER_SIZE, Header, checksum};
pub use envelope::{decode_payload, encode_payload};
pub use envelope::{deserialize, deserialize_into, deserialize_into_with, deserialize_with};
pub use envelope::{integrity_count, serialize};
pub use error::{CorruptedData, LatticeError, Result};
pub use kind::{Insertion, Kind, classify};
pub use pointer::Interior;
pub use poly::{Hierarchy, Poly, Polymorphic};

/// `#[derive(Archive)]` for structs with named, positional or no fields.
///
/// Fields are archived in declaration order; the same field list drives
/// `encode`, `decode` and `decode_in_place`.
///
/// ```
/// use vc_archive::{Archive, deserialize, serialize};
///
/// #[derive(Archive, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let bytes = serialize(&Point { x: 1, y: 2 });
/// assert_eq!(deserialize::<Point>(&bytes).unwrap(), Point { x: 1, y: 2 });
/// ```
pub use vc_archive_derive::Archive;
