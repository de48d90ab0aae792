//! Pointers to trait objects whose concrete class survives a round trip.
//!
//! A family is a trait object type such as `dyn Shape`, registered with
//! [`hierarchy!`](crate::hierarchy) as an ordered class list. [`Lattice`]
//! turns that list into minimal `(base, derived)` edges with stable
//! class-ids; [`Poly`] writes the id of the object's most-derived class
//! before its payload and rebuilds that class when decoding.

// -----------------------------------------------------------------------------
// Modules

mod hierarchy;
mod lattice;
mod pointer;

// -----------------------------------------------------------------------------
// Exports

pub use hierarchy::{Class, Hierarchy, Polymorphic};
pub use lattice::{ClassId, ClassNode, Edge, Lattice};
pub use pointer::Poly;

pub(crate) use hierarchy::FamilyCache;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{ClassId, Poly, Polymorphic};
    use crate::{Archive, decode_payload, encode_payload};

    trait Shape: Polymorphic {
        fn sides(&self) -> u32;
    }

    #[derive(Archive, Debug, PartialEq)]
    struct Base {
        tag: u8,
    }

    #[derive(Archive, Debug, PartialEq)]
    struct A {
        base: Base,
        a: u16,
    }

    #[derive(Archive, Debug, PartialEq)]
    struct B {
        b: i8,
    }

    #[derive(Archive, Debug, PartialEq)]
    struct C {
        a: A,
        c: u32,
    }

    #[derive(Archive)]
    struct Stranger;

    impl Shape for Base {
        fn sides(&self) -> u32 {
            0
        }
    }

    impl Shape for A {
        fn sides(&self) -> u32 {
            3
        }
    }

    impl Shape for B {
        fn sides(&self) -> u32 {
            4
        }
    }

    impl Shape for C {
        fn sides(&self) -> u32 {
            5
        }
    }

    impl Shape for Stranger {
        fn sides(&self) -> u32 {
            1
        }
    }

    crate::hierarchy! {
        dyn Shape => [
            Base;
            A: Base;
            B: Base;
            C: A;
        ]
    }

    fn c() -> C {
        C {
            a: A {
                base: Base { tag: 1 },
                a: 2,
            },
            c: 3,
        }
    }

    #[test]
    fn most_derived_class_is_written() {
        let ptr: Poly<dyn Shape> = Poly::new(Rc::new(c()));
        let bytes = encode_payload(&ptr);

        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &2_u32.to_le_bytes());
        assert_eq!(bytes.len(), 1 + 4 + 1 + 2 + 4);

        let back = decode_payload::<Poly<dyn Shape>>(&bytes).unwrap();
        assert!(back.is::<C>());
        assert_eq!(back.downcast_ref::<C>(), Some(&c()));
        assert_eq!(back.get().map(Shape::sides), Some(5));
    }

    #[test]
    fn static_base_uses_not_found() {
        let ptr: Poly<dyn Shape> = Poly::new(Rc::new(Base { tag: 9 }));
        let bytes = encode_payload(&ptr);
        assert_eq!(&bytes[1..5], &ClassId::NOT_FOUND.0.to_le_bytes());

        let back = decode_payload::<Poly<dyn Shape>>(&bytes).unwrap();
        assert_eq!(back.downcast_ref::<Base>(), Some(&Base { tag: 9 }));
    }

    #[test]
    fn each_class_round_trips() {
        let objects: Vec<Poly<dyn Shape>> = vec![
            Poly::new(Rc::new(Base { tag: 0 })),
            Poly::new(Rc::new(A {
                base: Base { tag: 1 },
                a: 7,
            })),
            Poly::new(Rc::new(B { b: -1 })),
            Poly::new(Rc::new(c())),
            Poly::null(),
        ];
        let back = decode_payload::<Vec<Poly<dyn Shape>>>(&encode_payload(&objects)).unwrap();

        let sides: Vec<_> = back.iter().map(|p| p.get().map(Shape::sides)).collect();
        assert_eq!(sides, [Some(0), Some(3), Some(4), Some(5), None]);
        assert!(back[4].is_null());
    }

    #[test]
    fn aliases_share_one_object() {
        let shared: Rc<dyn Shape> = Rc::new(B { b: 4 });
        let pair = (Poly::new(shared.clone()), Poly::new(shared));
        let bytes = encode_payload(&pair);

        let (x, y) = decode_payload::<(Poly<dyn Shape>, Poly<dyn Shape>)>(&bytes).unwrap();
        assert!(x.ptr_eq(&y));
        assert!(y.is::<B>());
    }

    #[test]
    #[should_panic(expected = "is not registered in the hierarchy")]
    fn unregistered_runtime_class() {
        let ptr: Poly<dyn Shape> = Poly::new(Rc::new(Stranger));
        let _ = encode_payload(&ptr);
    }

    #[test]
    #[should_panic(expected = "has no registration")]
    fn unknown_class_id() {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&77_u32.to_le_bytes());
        let _ = decode_payload::<Poly<dyn Shape>>(&bytes);
    }
}
