use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::type_name;
use core::cell::OnceCell;
use core::fmt;

use crate::pointer::{Allocation, address_of};
use crate::{Archive, Decoder, Encoder, Kind, Result};

// -----------------------------------------------------------------------------
// Interior

enum Anchor<T> {
    Block(Rc<[T]>, usize),
    Single(Rc<T>),
}

/// A pointer to one element inside a shared allocation.
///
/// An `Interior` never owns an allocation of its own on the wire: it is
/// written as `(owning allocation id, byte offset)` in the finalize block
/// after the main payload, and rebound to the matching element of the
/// rebuilt block when decoding. The owning `Rc<[T]>` or `Rc<T>` must be
/// archived somewhere in the same value.
///
/// A freshly decoded `Interior` is unbound until the decoder finishes;
/// dereferencing it earlier panics.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use vc_archive::{Interior, deserialize, serialize};
///
/// let block: Rc<[u32]> = Rc::from([10, 20, 30]);
/// let cursor = Interior::new(&block, 2);
///
/// let bytes = serialize(&(block, cursor));
/// let (block, cursor) = deserialize::<(Rc<[u32]>, Interior<u32>)>(&bytes).unwrap();
///
/// assert_eq!(*cursor, 30);
/// assert!(cursor.points_into(&block));
/// ```
pub struct Interior<T: 'static> {
    anchor: Rc<OnceCell<Anchor<T>>>,
}

impl<T: 'static> Interior<T> {
    /// Points at `block[index]`.
    ///
    /// # Panics
    /// If `index` is out of bounds, or `T` is zero-sized: every element of
    /// such a block shares one address, so the index could not be recovered.
    pub fn new(block: &Rc<[T]>, index: usize) -> Self {
        assert!(
            size_of::<T>() != 0,
            "interior pointers into blocks of zero-sized `{}` are not supported",
            type_name::<T>(),
        );
        assert!(
            index < block.len(),
            "interior index {index} out of bounds for a block of {}",
            block.len(),
        );
        Self::bound(Anchor::Block(block.clone(), index))
    }

    /// Points at the whole pointee of `single`.
    pub fn to(single: &Rc<T>) -> Self {
        Self::bound(Anchor::Single(single.clone()))
    }

    fn bound(anchor: Anchor<T>) -> Self {
        Self {
            anchor: Rc::new(OnceCell::from(anchor)),
        }
    }

    fn unbound() -> Self {
        Self {
            anchor: Rc::new(OnceCell::new()),
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.anchor.get().is_some()
    }

    fn anchor(&self) -> &Anchor<T> {
        match self.anchor.get() {
            Some(anchor) => anchor,
            None => panic!("interior pointer used before the decoder bound it"),
        }
    }

    /// Element index inside the owning block, `0` for a single pointee.
    pub fn index(&self) -> usize {
        match self.anchor() {
            Anchor::Block(_, index) => *index,
            Anchor::Single(_) => 0,
        }
    }

    /// The owning block, if this points into one.
    pub fn block(&self) -> Option<Rc<[T]>> {
        match self.anchor() {
            Anchor::Block(block, _) => Some(block.clone()),
            Anchor::Single(_) => None,
        }
    }

    /// Whether this points into `block`'s allocation.
    pub fn points_into(&self, block: &Rc<[T]>) -> bool {
        match self.anchor() {
            Anchor::Block(own, _) => Rc::ptr_eq(own, block),
            Anchor::Single(_) => false,
        }
    }

    /// Whether both point at the same element of the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }

    fn address(&self) -> usize {
        match self.anchor() {
            Anchor::Block(block, index) => {
                address_of(Rc::as_ptr(block).cast::<T>().wrapping_add(*index))
            }
            Anchor::Single(single) => address_of(Rc::as_ptr(single)),
        }
    }
}

impl<T: 'static> core::ops::Deref for Interior<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.anchor() {
            Anchor::Block(block, index) => &block[*index],
            Anchor::Single(single) => single,
        }
    }
}

impl<T: 'static> Clone for Interior<T> {
    fn clone(&self) -> Self {
        Self {
            anchor: self.anchor.clone(),
        }
    }
}

impl<T: PartialEq + 'static> PartialEq for Interior<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index() && **self == **other
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Interior<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor.get() {
            Some(_) => f
                .debug_struct("Interior")
                .field("index", &self.index())
                .field("value", &**self)
                .finish(),
            None => f.write_str("Interior(<unbound>)"),
        }
    }
}

// -----------------------------------------------------------------------------
// Deferred binding

/// An interior pointer waiting for the decoder's finalize step.
pub(crate) trait PendingInterior {
    /// Binds to `offset` bytes into the allocation `head`.
    fn bind(&self, head: &Allocation, offset: usize);
}

impl<T: 'static> PendingInterior for Interior<T> {
    fn bind(&self, head: &Allocation, offset: usize) {
        let single = || {
            head.cloned::<Rc<T>>()
                .or_else(|| head.erased()?.clone().downcast::<T>().ok())
        };

        let anchor = if let Some(block) = head.handle().downcast_ref::<Rc<[T]>>() {
            let width = size_of::<T>();
            let index = if width == 0 { 0 } else { offset / width };
            assert!(
                offset % width.max(1) == 0 && index < block.len().max(1),
                "interior offset {offset} does not name an element of a `[{}]` block of {}",
                type_name::<T>(),
                block.len(),
            );
            Anchor::Block(block.clone(), index)
        } else if let Some(single) = single() {
            assert_eq!(offset, 0, "interior offset into a single `{}`", type_name::<T>());
            Anchor::Single(single)
        } else {
            panic!(
                "interior pointer to `{}` resolved to an allocation of another type",
                type_name::<T>()
            );
        };

        if self.anchor.set(anchor).is_err() {
            panic!("interior pointer bound twice");
        }
    }
}

// -----------------------------------------------------------------------------
// Archive

impl<T: 'static> Archive for Interior<T> {
    const KIND: Kind = Kind::InteriorPointer;

    fn encode(&self, enc: &mut Encoder) {
        enc.defer_interior(self.address());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let this = Self::unbound();
        dec.defer_interior(Box::new(this.clone()));
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Tests
