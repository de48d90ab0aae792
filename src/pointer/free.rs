use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use foldhash::fast::FixedState;
use hashbrown::HashSet;

use crate::REGISTRY_STATE;

// -----------------------------------------------------------------------------
// FreeVerifier

/// Releases allocations replaced while decoding into an existing value.
///
/// Several pointer fields may share one allocation. The first handle seen
/// for an address is kept until [`finish`](Self::finish) and released there;
/// later handles to an address already taken are dropped immediately, which
/// only gives up their share. Each address is therefore released at most
/// once per pass, and never while the pass still reads from the graph.
pub struct FreeVerifier {
    released: HashSet<usize, FixedState>,
    graveyard: Vec<Box<dyn Any>>,
}

impl FreeVerifier {
    pub const fn new() -> Self {
        Self {
            released: HashSet::with_hasher(REGISTRY_STATE),
            graveyard: Vec::new(),
        }
    }

    /// Whether `addr` has not been released yet in this pass.
    #[inline]
    pub fn is_freeable(&self, addr: usize) -> bool {
        !self.released.contains(&addr)
    }

    /// Hands over the previous owner of `addr`.
    ///
    /// Returns `true` if this call took the release for `addr`.
    pub fn release(&mut self, addr: usize, owner: Box<dyn Any>) -> bool {
        if self.released.insert(addr) {
            self.graveyard.push(owner);
            true
        } else {
            false
        }
    }

    /// Number of distinct addresses released.
    #[inline]
    pub fn released(&self) -> usize {
        self.released.len()
    }

    /// Drops every retained owner and reports how many were released.
    pub fn finish(self) -> usize {
        let count = self.released.len();
        drop(self.graveyard);
        count
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;

    use super::FreeVerifier;
    use crate::pointer::address_of;

    #[test]
    fn each_address_released_once() {
        let shared = Rc::new(9_u64);
        let weak = Rc::downgrade(&shared);
        let addr = address_of(Rc::as_ptr(&shared));

        let mut verifier = FreeVerifier::new();
        assert!(verifier.is_freeable(addr));
        assert!(verifier.release(addr, Box::new(shared.clone())));
        assert!(!verifier.is_freeable(addr));
        assert!(!verifier.release(addr, Box::new(shared)));

        assert_eq!(verifier.released(), 1);
        assert!(weak.upgrade().is_some());
        assert_eq!(verifier.finish(), 1);
        assert!(weak.upgrade().is_none());
    }
}
