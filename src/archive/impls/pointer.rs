use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem;

use crate::pointer::{Allocation, address_of};
use crate::{Archive, Decoder, Encoder, Kind, Result};

// -----------------------------------------------------------------------------
// Shared pointers

/// An `Rc<T>` sharing an allocation first rebuilt as `Rc<T>`, or through a
/// polymorphic pointer whose concrete class is `T`.
fn adopt_rc<T: 'static>(allocation: &Allocation) -> Option<Rc<T>> {
    allocation
        .cloned::<Rc<T>>()
        .or_else(|| allocation.erased()?.clone().downcast::<T>().ok())
}

fn adopt_arc<T: 'static>(allocation: &Allocation) -> Option<Arc<T>> {
    allocation.cloned::<Arc<T>>()
}

/// Payload of a slice allocation: element count, then the elements.
fn encode_block<T: Archive>(enc: &mut Encoder, block: &[T]) {
    enc.write_len(block.len());
    for item in block {
        item.encode(enc);
    }
}

macro_rules! impl_archive_shared {
    ($ptr:ident, $adopt:ident) => {
        impl<T: Archive + 'static> Archive for $ptr<T> {
            const KIND: Kind = Kind::StablePointer;

            fn encode(&self, enc: &mut Encoder) {
                let addr = address_of($ptr::as_ptr(self));
                enc.write_shared(addr, size_of::<T>(), |enc| T::encode(self, enc));
            }

            fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
                dec.read_shared_with(|dec| T::decode(dec).map($ptr::new), $adopt::<T>)
            }

            fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
                let fresh = Self::decode(dec)?;
                let old = mem::replace(self, fresh);
                dec.retire(address_of($ptr::as_ptr(&old)), old);
                Ok(())
            }
        }

        impl<T: Archive + 'static> Archive for $ptr<[T]> {
            const KIND: Kind = Kind::StablePointer;

            fn encode(&self, enc: &mut Encoder) {
                let addr = address_of($ptr::as_ptr(self));
                let extent = self.len() * size_of::<T>();
                enc.write_shared(addr, extent, |enc| encode_block(enc, self));
            }

            fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
                dec.read_shared(|dec| Vec::<T>::decode(dec).map($ptr::from))
            }

            fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
                let fresh = Self::decode(dec)?;
                let old = mem::replace(self, fresh);
                dec.retire(address_of($ptr::as_ptr(&old)), old);
                Ok(())
            }
        }
    };
}

impl_archive_shared!(Rc, adopt_rc);
impl_archive_shared!(Arc, adopt_arc);

// -----------------------------------------------------------------------------
// Unique pointers

impl<T: Archive + 'static> Archive for Box<T> {
    const KIND: Kind = Kind::StablePointer;

    fn encode(&self, enc: &mut Encoder) {
        enc.write_unique(|enc| T::encode(self, enc));
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.read_unique(|dec| T::decode(dec).map(Box::new))
    }

    fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let fresh = Self::decode(dec)?;
        let old = mem::replace(self, fresh);
        dec.retire(address_of::<T>(&*old), old);
        Ok(())
    }
}

impl<T: Archive + 'static> Archive for Box<[T]> {
    const KIND: Kind = Kind::StablePointer;

    fn encode(&self, enc: &mut Encoder) {
        enc.write_unique(|enc| encode_block(enc, self));
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.read_unique(|dec| Vec::<T>::decode(dec).map(Vec::into_boxed_slice))
    }
}

// -----------------------------------------------------------------------------
// Tests
