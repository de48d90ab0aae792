use alloc::rc::Rc;
use core::fmt;
use core::mem;

use crate::pointer::{Allocation, address_of};
use crate::poly::{ClassId, Hierarchy};
use crate::{Archive, Decoder, Encoder, Kind, Result};

// -----------------------------------------------------------------------------
// Poly

/// A nullable shared pointer to a member of the family `F`.
///
/// `F` is a trait object such as `dyn Shape` with a [`Hierarchy`]. On the
/// wire a `Poly` is a pointer tag; a `NEW` tag is followed by the class-id of
/// the most-derived registered class and that class's own payload, so the
/// object comes back as the same concrete type. Aliases of one allocation
/// are written once, as for `Rc`.
pub struct Poly<F: ?Sized>(Option<Rc<F>>);

impl<F: ?Sized> Poly<F> {
    #[inline]
    pub fn new(object: Rc<F>) -> Self {
        Self(Some(object))
    }

    #[inline]
    pub const fn null() -> Self {
        Self(None)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn get(&self) -> Option<&F> {
        self.0.as_deref()
    }

    #[inline]
    pub fn as_rc(&self) -> Option<&Rc<F>> {
        self.0.as_ref()
    }

    /// Whether both are null or both point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn address(&self) -> Option<usize> {
        self.0.as_ref().map(|rc| address_of(Rc::as_ptr(rc)))
    }
}

impl<F: ?Sized + Hierarchy> Poly<F> {
    /// The pointee as its concrete class `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        F::polymorphic(self.get()?).as_any().downcast_ref::<T>()
    }

    /// Whether the pointee's runtime class is exactly `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl<F: ?Sized> Clone for Poly<F> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<F: ?Sized> Default for Poly<F> {
    fn default() -> Self {
        Self::null()
    }
}

impl<F: ?Sized> From<Rc<F>> for Poly<F> {
    fn from(object: Rc<F>) -> Self {
        Self::new(object)
    }
}

impl<F: ?Sized + Hierarchy> fmt::Debug for Poly<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(object) => write!(f, "Poly<{}>", F::polymorphic(object).class_name()),
            None => f.write_str("Poly(null)"),
        }
    }
}

// -----------------------------------------------------------------------------
// Archive

impl<F: ?Sized + Hierarchy> Archive for Poly<F> {
    const KIND: Kind = Kind::PolymorphicPointer;

    fn encode(&self, enc: &mut Encoder) {
        let Some(rc) = &self.0 else {
            enc.write_null();
            return;
        };

        let object = F::polymorphic(rc);
        let family = enc.families.get::<F>();
        let id = family.lattice.resolve(family.class_of(object));

        let addr = address_of(Rc::as_ptr(rc));
        enc.write_shared(addr, size_of_val::<F>(rc), |enc| {
            enc.write_scalar(id.0);
            object.encode_dyn(enc);
        });
    }

    /// A `REUSE` may name an allocation first rebuilt through an `Rc` of
    /// its concrete class; a `NEW` records an erased view so such an `Rc`
    /// can follow.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let family = dec.families.get::<F>();
        let object = dec.read_pointer(
            |dec| {
                let id = ClassId(dec.read_scalar::<u32>()?);
                let class = family.lattice.id_resolve(id);
                (family.classes[class].decode)(dec)
            },
            |allocation| {
                allocation.cloned::<Rc<F>>().or_else(|| {
                    family
                        .classes
                        .iter()
                        .find_map(|class| (class.upcast)(allocation.handle()))
                })
            },
            |object| Allocation::of(object).with_erased(F::erase(object.clone())),
        )?;
        Ok(Self(object))
    }

    fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let fresh = Self::decode(dec)?;
        let addr = self.address();
        let old = mem::replace(self, fresh);
        if let (Some(addr), Some(rc)) = (addr, old.0) {
            dec.retire(addr, rc);
        }
        Ok(())
    }
}
