use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};

use foldhash::fast::FixedState;
use hashbrown::HashMap;

use crate::poly::{ClassNode, Lattice};
use crate::{Archive, Decoder, Encoder, REGISTRY_STATE, Result};

// -----------------------------------------------------------------------------
// Polymorphic

/// Object-safe view of an [`Archive`] value, used behind trait objects.
///
/// Blanket-implemented for every `Archive + 'static` type. A family trait
/// lists it as a supertrait so `dyn Family` can be archived:
///
/// ```
/// use vc_archive::Polymorphic;
///
/// trait Shape: Polymorphic {
///     fn area(&self) -> f64;
/// }
/// ```
pub trait Polymorphic: Any {
    fn as_any(&self) -> &dyn Any;

    /// Writes the concrete value's payload.
    fn encode_dyn(&self, enc: &mut Encoder);

    fn class_name(&self) -> &'static str;
}

impl<T: Archive + 'static> Polymorphic for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn encode_dyn(&self, enc: &mut Encoder) {
        self.encode(enc);
    }

    #[inline]
    fn class_name(&self) -> &'static str {
        type_name::<T>()
    }
}

// -----------------------------------------------------------------------------
// Hierarchy

/// A registered class of a polymorphic family `F`.
pub struct Class<F: ?Sized> {
    pub name: &'static str,
    pub type_id: TypeId,
    /// Names of the direct parent classes.
    pub parents: &'static [&'static str],
    /// Decodes a payload of this class and erases it to the family type.
    pub decode: fn(&mut Decoder<'_>) -> Result<Rc<F>>,
    /// Views an `Rc` of this concrete class, passed as `&dyn Any`, as a
    /// family pointer to the same allocation.
    pub upcast: fn(&dyn Any) -> Option<Rc<F>>,
}

/// A closed family of classes archived through the trait object `Self`.
///
/// Usually implemented with [`hierarchy!`](crate::hierarchy). The first
/// class is the static base; every other class must derive from it through
/// the declared parents.
pub trait Hierarchy: 'static {
    /// All classes, in registration order.
    fn classes() -> Vec<Class<Self>>;

    fn polymorphic(this: &Self) -> &dyn Polymorphic;

    /// The same allocation as `Rc<dyn Any>`, so pointers of the concrete
    /// class can share it.
    fn erase(this: Rc<Self>) -> Rc<dyn Any>;
}

/// Implements [`Hierarchy`] for a trait object.
///
/// Classes are listed base first, one per `;`, each followed by its direct
/// parents. The order of the list decides the class-ids on the wire.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use vc_archive::{Archive, Poly, Polymorphic, deserialize, hierarchy, serialize};
///
/// trait Animal: Polymorphic {
///     fn legs(&self) -> u32;
/// }
///
/// #[derive(Archive)]
/// struct Creature;
///
/// #[derive(Archive)]
/// struct Dog {
///     tricks: u8,
/// }
///
/// impl Animal for Creature {
///     fn legs(&self) -> u32 { 0 }
/// }
///
/// impl Animal for Dog {
///     fn legs(&self) -> u32 { 4 }
/// }
///
/// hierarchy! {
///     dyn Animal => [
///         Creature;
///         Dog: Creature;
///     ]
/// }
///
/// let pet: Poly<dyn Animal> = Poly::new(Rc::new(Dog { tricks: 3 }));
/// let back = deserialize::<Poly<dyn Animal>>(&serialize(&pet)).unwrap();
///
/// assert_eq!(back.get().unwrap().legs(), 4);
/// assert_eq!(back.downcast_ref::<Dog>().unwrap().tricks, 3);
/// ```
#[macro_export]
macro_rules! hierarchy {
    ($family:ty => [ $($class:ident $(: $($parent:ident),+ )?);+ $(;)? ]) => {
        impl $crate::poly::Hierarchy for $family {
            fn classes() -> $crate::__macro_exports::Vec<$crate::poly::Class<Self>> {
                $crate::__macro_exports::vec![$({
                    fn decode(
                        dec: &mut $crate::Decoder<'_>,
                    ) -> $crate::Result<$crate::__macro_exports::Rc<$family>> {
                        let value = <$class as $crate::Archive>::decode(dec)?;
                        let object: $crate::__macro_exports::Rc<$family> =
                            $crate::__macro_exports::Rc::new(value);
                        ::core::result::Result::Ok(object)
                    }

                    fn upcast(
                        handle: &dyn $crate::__macro_exports::Any,
                    ) -> ::core::option::Option<$crate::__macro_exports::Rc<$family>> {
                        let concrete =
                            handle.downcast_ref::<$crate::__macro_exports::Rc<$class>>()?;
                        let object: $crate::__macro_exports::Rc<$family> = concrete.clone();
                        ::core::option::Option::Some(object)
                    }

                    $crate::poly::Class {
                        name: ::core::stringify!($class),
                        type_id: $crate::__macro_exports::TypeId::of::<$class>(),
                        parents: &[$($(::core::stringify!($parent)),+)?],
                        decode,
                        upcast,
                    }
                }),+]
            }

            #[inline]
            fn polymorphic(this: &Self) -> &dyn $crate::Polymorphic {
                this
            }

            #[inline]
            fn erase(
                this: $crate::__macro_exports::Rc<Self>,
            ) -> $crate::__macro_exports::Rc<dyn $crate::__macro_exports::Any> {
                this
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Family

/// A family's classes with their lattice, built once per archive pass.
pub(crate) struct Family<F: ?Sized + 'static> {
    pub classes: Vec<Class<F>>,
    pub lattice: Lattice,
    by_type: HashMap<TypeId, usize, FixedState>,
}

impl<F: ?Sized + Hierarchy> Family<F> {
    /// # Panics
    /// If the class list does not form a valid lattice.
    fn build() -> Self {
        let classes = F::classes();
        let nodes: Vec<ClassNode> = classes
            .iter()
            .map(|class| ClassNode {
                name: class.name,
                parents: class.parents,
            })
            .collect();

        let lattice = match Lattice::build(&nodes) {
            Ok(lattice) => lattice,
            Err(e) => panic!("invalid hierarchy for `{}`: {e}", type_name::<F>()),
        };

        let mut by_type = HashMap::with_capacity_and_hasher(classes.len(), REGISTRY_STATE);
        for (index, class) in classes.iter().enumerate() {
            by_type.insert(class.type_id, index);
        }

        Self {
            classes,
            lattice,
            by_type,
        }
    }

    /// Registration index of the runtime class behind `object`.
    ///
    /// # Panics
    /// If that class is not registered in this family.
    pub fn class_of(&self, object: &dyn Polymorphic) -> usize {
        match self.by_type.get(&object.as_any().type_id()) {
            Some(&index) => index,
            None => panic!(
                "`{}` is not registered in the hierarchy of `{}`",
                object.class_name(),
                type_name::<F>(),
            ),
        }
    }
}

/// Families built during one pass, keyed by family type.
pub(crate) struct FamilyCache(HashMap<TypeId, Box<dyn Any>, FixedState>);

impl FamilyCache {
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(REGISTRY_STATE))
    }

    pub fn get<F: ?Sized + Hierarchy>(&mut self) -> Rc<Family<F>> {
        let entry = self
            .0
            .entry(TypeId::of::<F>())
            .or_insert_with(|| Box::new(Rc::new(Family::<F>::build())));
        match entry.downcast_ref::<Rc<Family<F>>>() {
            Some(family) => family.clone(),
            None => unreachable!("family cache is keyed by family type"),
        }
    }
}
