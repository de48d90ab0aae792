//! [`Archive`](crate::Archive) for the standard shapes.
//!
//! - Primitives: integers, floats, `bool`, `char`. `usize` and `isize` are
//!   always 8 bytes on the wire.
//! - Nillable: `Option<T>`.
//! - Tuple-like: tuples up to twelve fields, `()` and `[T; N]`.
//! - Containers: `Vec`, `VecDeque`, `BinaryHeap`, `String`, `BTreeSet`,
//!   `BTreeMap`, the `hashbrown` maps and sets, and with `std` the standard
//!   hash maps and sets.
//! - Stable pointers: `Rc`, `Arc` and `Box`, for sized pointees and slices.

mod container;
mod nillable;
mod pointer;
mod primitive;
mod tuple;
