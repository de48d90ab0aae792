//! Paths used by code that `vc_archive` macros expand to.

pub use alloc::rc::Rc;
pub use alloc::vec;
pub use alloc::vec::Vec;
pub use core::any::{Any, TypeId};
