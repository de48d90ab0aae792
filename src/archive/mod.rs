//! The recursive archiver.
//!
//! [`Archive`] is implemented once per shape; encoding and decoding walk a
//! value in the same structural order, so pointer ids assigned on one side
//! match the ids seen on the other.

// -----------------------------------------------------------------------------
// Modules

mod decoder;
mod encoder;
mod impls;

// -----------------------------------------------------------------------------
// Exports

pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::{Kind, Result};

// -----------------------------------------------------------------------------
// Archive

/// A value with a binary encoding.
///
/// `encode` and `decode` must visit sub-values in the same order. The
/// derive macro generates all three methods from one field list.
///
/// # Examples
///
/// Implementing the trait by hand for an enum:
///
/// ```
/// use vc_archive::{Archive, CorruptedData, Decoder, Encoder, Kind, Result};
///
/// #[derive(Debug, PartialEq)]
/// enum Light {
///     Off,
///     Dimmed(u8),
/// }
///
/// impl Archive for Light {
///     const KIND: Kind = Kind::Reflectible;
///
///     fn encode(&self, enc: &mut Encoder) {
///         match self {
///             Light::Off => enc.write_scalar(0_u8),
///             Light::Dimmed(level) => {
///                 enc.write_scalar(1_u8);
///                 level.encode(enc);
///             }
///         }
///     }
///
///     fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
///         match dec.read_scalar::<u8>()? {
///             0 => Ok(Light::Off),
///             1 => Ok(Light::Dimmed(u8::decode(dec)?)),
///             _ => Err(CorruptedData::InvalidValue { what: "light variant" }),
///         }
///     }
/// }
///
/// let bytes = vc_archive::serialize(&Light::Dimmed(40));
/// assert_eq!(vc_archive::deserialize::<Light>(&bytes), Ok(Light::Dimmed(40)));
/// ```
pub trait Archive: Sized {
    /// The encoding rule this type follows.
    const KIND: Kind;

    fn encode(&self, enc: &mut Encoder);

    fn decode(dec: &mut Decoder<'_>) -> Result<Self>;

    /// Decodes over an existing value.
    ///
    /// Pointer types hand the allocation they replace to the decoder's
    /// [`FreeVerifier`](crate::pointer::FreeVerifier); aggregates forward to
    /// their parts so nested pointers do the same.
    fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        *self = Self::decode(dec)?;
        Ok(())
    }
}
