use crate::Archive;

// -----------------------------------------------------------------------------
// Kind

/// How a container places decoded elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Insertion {
    /// Push to the end, preserving wire order (sequences, strings, heaps).
    Append,
    /// Insert by key or value (sets, maps).
    Keyed,
}

/// The encoding rule a type follows.
///
/// Every [`Archive`] type names exactly one kind through [`Archive::KIND`];
/// a type outside the supported universe simply has no `Archive` impl and
/// is rejected at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Primitive,
    Nillable,
    TupleLike,
    Container(Insertion),
    Reflectible,
    StablePointer,
    InteriorPointer,
    PolymorphicPointer,
}

impl Kind {
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Primitive => "primitive",
            Kind::Nillable => "nillable",
            Kind::TupleLike => "tuple-like",
            Kind::Container(Insertion::Append) => "sequence container",
            Kind::Container(Insertion::Keyed) => "keyed container",
            Kind::Reflectible => "reflectible object",
            Kind::StablePointer => "stable pointer",
            Kind::InteriorPointer => "interior pointer",
            Kind::PolymorphicPointer => "polymorphic pointer",
        }
    }

    /// Whether values of this kind take part in pointer identity.
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Kind::StablePointer | Kind::InteriorPointer | Kind::PolymorphicPointer
        )
    }
}

/// Returns the kind `T` is archived as.
///
/// # Examples
///
/// ```
/// use vc_archive::{Insertion, Kind, classify};
///
/// assert_eq!(classify::<u32>(), Kind::Primitive);
/// assert_eq!(classify::<Option<u8>>(), Kind::Nillable);
/// assert_eq!(classify::<String>(), Kind::Container(Insertion::Append));
/// ```
#[inline]
pub const fn classify<T: Archive>() -> Kind {
    T::KIND
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::{Insertion, Kind, classify};
    use crate::{Archive, Interior};

    #[derive(Archive)]
    struct Unit;

    #[derive(Archive)]
    struct Pair(u8, u16);

    #[test]
    fn every_shape_has_one_kind() {
        assert_eq!(classify::<bool>(), Kind::Primitive);
        assert_eq!(classify::<char>(), Kind::Primitive);
        assert_eq!(classify::<f64>(), Kind::Primitive);
        assert_eq!(classify::<usize>(), Kind::Primitive);
        assert_eq!(classify::<Option<String>>(), Kind::Nillable);
        assert_eq!(classify::<()>(), Kind::TupleLike);
        assert_eq!(classify::<(u8, i64)>(), Kind::TupleLike);
        assert_eq!(classify::<[u8; 4]>(), Kind::TupleLike);
        assert_eq!(classify::<Vec<u8>>(), Kind::Container(Insertion::Append));
        assert_eq!(classify::<VecDeque<u8>>(), Kind::Container(Insertion::Append));
        assert_eq!(classify::<BinaryHeap<u8>>(), Kind::Container(Insertion::Append));
        assert_eq!(classify::<BTreeSet<u8>>(), Kind::Container(Insertion::Keyed));
        assert_eq!(classify::<BTreeMap<u8, u8>>(), Kind::Container(Insertion::Keyed));
        assert_eq!(classify::<Unit>(), Kind::Reflectible);
        assert_eq!(classify::<Pair>(), Kind::Reflectible);
        assert_eq!(classify::<Rc<u8>>(), Kind::StablePointer);
        assert_eq!(classify::<Arc<[u8]>>(), Kind::StablePointer);
        assert_eq!(classify::<Interior<u8>>(), Kind::InteriorPointer);
    }

    #[test]
    fn pointer_kinds() {
        assert!(Kind::StablePointer.is_pointer());
        assert!(Kind::PolymorphicPointer.is_pointer());
        assert!(!Kind::Container(Insertion::Keyed).is_pointer());
        assert_eq!(Kind::InteriorPointer.name(), "interior pointer");
    }
}
