use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, type_name};

use foldhash::fast::FixedState;
use hashbrown::HashMap;

use crate::REGISTRY_STATE;

// -----------------------------------------------------------------------------
// PointerIdRegistry

/// Encode-side map from an allocation's address to its id.
///
/// Ids are ordinals of first encounter: the `n`th distinct allocation
/// written in a pass gets id `n`. Unique pointers consume an id through
/// [`next_id`](Self::next_id) without being registered, since nothing else
/// may alias them.
pub struct PointerIdRegistry {
    ids: HashMap<usize, u64, FixedState>,
    next: u64,
}

impl PointerIdRegistry {
    pub const fn new() -> Self {
        Self {
            ids: HashMap::with_hasher(REGISTRY_STATE),
            next: 0,
        }
    }

    #[inline]
    pub fn exists(&self, addr: usize) -> bool {
        self.ids.contains_key(&addr)
    }

    #[inline]
    pub fn get(&self, addr: usize) -> Option<u64> {
        self.ids.get(&addr).copied()
    }

    /// Registers `addr` under `id`.
    ///
    /// # Panics
    /// If `addr` was already registered.
    pub fn insert(&mut self, addr: usize, id: u64) {
        let prev = self.ids.insert(addr, id);
        assert!(prev.is_none(), "allocation {addr:#x} registered twice");
    }

    /// Hands out the next ordinal id.
    #[inline]
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Ids handed out so far.
    #[inline]
    pub fn count(&self) -> u64 {
        self.next
    }
}

// -----------------------------------------------------------------------------
// Allocation

/// One rebuilt allocation.
///
/// `handle` is what the first pointer to the allocation produced, such as an
/// `Rc<Node>` or an `Rc<dyn Shape>`. When that handle's static type hides
/// the concrete one, `erased` keeps an `Rc<dyn Any>` of the same allocation
/// so later pointers of the concrete type can still share it.
pub struct Allocation {
    handle: Box<dyn Any>,
    erased: Option<Rc<dyn Any>>,
}

impl Allocation {
    #[inline]
    pub fn new(handle: Box<dyn Any>) -> Self {
        Self {
            handle,
            erased: None,
        }
    }

    /// An allocation holding a clone of `handle`.
    #[inline]
    pub fn of<P: Clone + 'static>(handle: &P) -> Self {
        Self::new(Box::new(handle.clone()))
    }

    #[inline]
    pub fn with_erased(mut self, erased: Rc<dyn Any>) -> Self {
        self.erased = Some(erased);
        self
    }

    #[inline]
    pub fn handle(&self) -> &dyn Any {
        self.handle.as_ref()
    }

    #[inline]
    pub fn erased(&self) -> Option<&Rc<dyn Any>> {
        self.erased.as_ref()
    }

    /// A clone of the handle if it is a `P`.
    #[inline]
    pub fn cloned<P: Clone + 'static>(&self) -> Option<P> {
        self.handle.downcast_ref::<P>().cloned()
    }
}

// -----------------------------------------------------------------------------
// PointerAddrRegistry

/// Decode-side arena: slot `id` holds the allocation rebuilt for id `id`.
///
/// A slot is reserved when its `NEW` tag is read and filled once the pointee
/// is decoded, so ids line up with the encoder's ordinals even when pointees
/// contain further pointers.
pub struct PointerAddrRegistry {
    slots: Vec<Option<Allocation>>,
}

impl PointerAddrRegistry {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Reserves the next id; its slot stays pending until [`fill`](Self::fill).
    #[inline]
    pub fn reserve(&mut self) -> u64 {
        self.slots.push(None);
        (self.slots.len() - 1) as u64
    }

    pub fn fill(&mut self, id: u64, allocation: Allocation) {
        let slot = self.slot_mut(id);
        assert!(slot.is_none(), "pointer id {id} decoded twice");
        *slot = Some(allocation);
    }

    /// The allocation stored for `id`.
    ///
    /// # Panics
    /// If `id` was never reserved, or its pointee is still being decoded
    /// (a back-reference from inside itself).
    pub fn allocation(&self, id: u64) -> &Allocation {
        let slot = usize::try_from(id).ok().and_then(|index| self.slots.get(index));
        match slot {
            Some(Some(allocation)) => allocation,
            Some(None) => panic!("pointer id {id} referenced while its pointee is still being decoded"),
            None => panic!("pointer id {id} referenced before its first occurrence"),
        }
    }

    /// Turns the allocation stored for `id` into a `P` with `adopt`.
    ///
    /// # Panics
    /// As [`allocation`](Self::allocation), or if `adopt` finds no `P` there.
    pub fn adopt<P>(&self, id: u64, adopt: impl FnOnce(&Allocation) -> Option<P>) -> P {
        match adopt(self.allocation(id)) {
            Some(handle) => handle,
            None => panic!("pointer id {id} does not hold a `{}`", type_name::<P>()),
        }
    }

    /// A clone of the handle stored for `id`.
    #[inline]
    pub fn get<P: Clone + 'static>(&self, id: u64) -> P {
        self.adopt(id, Allocation::cloned::<P>)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    fn slot_mut(&mut self, id: u64) -> &mut Option<Allocation> {
        let len = self.slots.len();
        match usize::try_from(id).ok().and_then(|index| self.slots.get_mut(index)) {
            Some(slot) => slot,
            None => panic!("pointer id {id} out of range ({len} reserved)"),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
