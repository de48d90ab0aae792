use alloc::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;

use crate::{Archive, CorruptedData, Decoder, Encoder, Insertion, Kind, Result};

// -----------------------------------------------------------------------------
// Helpers

fn encode_items<'a, T: Archive + 'a>(
    enc: &mut Encoder,
    len: usize,
    items: impl IntoIterator<Item = &'a T>,
) {
    enc.write_len(len);
    for item in items {
        item.encode(enc);
    }
}

/// Reads a count, builds the container with a capped reservation and
/// decodes that many elements into it.
fn decode_items<C, E: Archive>(
    dec: &mut Decoder<'_>,
    with_capacity: impl FnOnce(usize) -> C,
    mut insert: impl FnMut(&mut C, E, &Decoder<'_>) -> Result<()>,
) -> Result<C> {
    let count = dec.read_len()?;
    let mut container = with_capacity(dec.reserve_hint(count));
    for _ in 0..count {
        let item = E::decode(dec)?;
        insert(&mut container, item, dec)?;
    }
    Ok(container)
}

// -----------------------------------------------------------------------------
// Sequences

impl<T: Archive> Archive for Vec<T> {
    const KIND: Kind = Kind::Container(Insertion::Append);

    fn encode(&self, enc: &mut Encoder) {
        encode_items(enc, self.len(), self);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        decode_items::<_, T>(dec, Vec::with_capacity, |vec, item, _| {
            vec.push(item);
            Ok(())
        })
    }
}

impl<T: Archive> Archive for VecDeque<T> {
    const KIND: Kind = Kind::Container(Insertion::Append);

    fn encode(&self, enc: &mut Encoder) {
        encode_items(enc, self.len(), self);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        decode_items::<_, T>(dec, VecDeque::with_capacity, |deque, item, _| {
            deque.push_back(item);
            Ok(())
        })
    }
}

/// Written as its backing sequence; rebuilding from a valid heap layout
/// leaves the order unchanged.
impl<T: Archive + Ord> Archive for BinaryHeap<T> {
    const KIND: Kind = Kind::Container(Insertion::Append);

    fn encode(&self, enc: &mut Encoder) {
        encode_items(enc, self.len(), self.as_slice());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Vec::<T>::decode(dec).map(BinaryHeap::from)
    }
}

impl Archive for String {
    const KIND: Kind = Kind::Container(Insertion::Append);

    fn encode(&self, enc: &mut Encoder) {
        enc.write_len(self.len());
        enc.write_bytes(self.as_bytes());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let len = dec.read_len()?;
        let bytes = dec.read_bytes(len)?;
        match core::str::from_utf8(bytes) {
            Ok(text) => Ok(String::from(text)),
            Err(_) => Err(CorruptedData::InvalidValue { what: "utf-8 string" }),
        }
    }
}

// -----------------------------------------------------------------------------
// Keyed containers

fn set_insert(inserted: bool, dec: &Decoder<'_>) -> Result<()> {
    if inserted { Ok(()) } else { dec.duplicate_key() }
}

impl<T: Archive + Ord> Archive for BTreeSet<T> {
    const KIND: Kind = Kind::Container(Insertion::Keyed);

    fn encode(&self, enc: &mut Encoder) {
        encode_items(enc, self.len(), self);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        decode_items::<_, T>(dec, |_| BTreeSet::new(), |set, item, dec| {
            set_insert(set.insert(item), dec)
        })
    }
}

impl<K: Archive + Ord, V: Archive> Archive for BTreeMap<K, V> {
    const KIND: Kind = Kind::Container(Insertion::Keyed);

    fn encode(&self, enc: &mut Encoder) {
        enc.write_len(self.len());
        for (key, value) in self {
            key.encode(enc);
            value.encode(enc);
        }
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        decode_items::<_, (K, V)>(dec, |_| BTreeMap::new(), |map, (key, value), dec| {
            if map.contains_key(&key) {
                dec.duplicate_key()
            } else {
                map.insert(key, value);
                Ok(())
            }
        })
    }
}

macro_rules! impl_archive_hash_containers {
    ($map:ident, $set:ident) => {
        impl<K, V, S> Archive for $map<K, V, S>
        where
            K: Archive + Eq + Hash,
            V: Archive,
            S: BuildHasher + Default,
        {
            const KIND: Kind = Kind::Container(Insertion::Keyed);

            fn encode(&self, enc: &mut Encoder) {
                enc.write_len(self.len());
                for (key, value) in self {
                    key.encode(enc);
                    value.encode(enc);
                }
            }

            fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
                decode_items::<_, (K, V)>(
                    dec,
                    |capacity| $map::with_capacity_and_hasher(capacity, S::default()),
                    |map, (key, value), dec| {
                        if map.contains_key(&key) {
                            dec.duplicate_key()
                        } else {
                            map.insert(key, value);
                            Ok(())
                        }
                    },
                )
            }
        }

        impl<T, S> Archive for $set<T, S>
        where
            T: Archive + Eq + Hash,
            S: BuildHasher + Default,
        {
            const KIND: Kind = Kind::Container(Insertion::Keyed);

            fn encode(&self, enc: &mut Encoder) {
                encode_items(enc, self.len(), self);
            }

            fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
                decode_items::<_, T>(
                    dec,
                    |capacity| $set::with_capacity_and_hasher(capacity, S::default()),
                    |set, item, dec| set_insert(set.insert(item), dec),
                )
            }
        }
    };
}

mod hashbrown_impls {
    use core::hash::{BuildHasher, Hash};

    use hashbrown::{HashMap, HashSet};

    use super::{decode_items, encode_items, set_insert};
    use crate::{Archive, Decoder, Encoder, Insertion, Kind, Result};

    impl_archive_hash_containers!(HashMap, HashSet);
}

#[cfg(feature = "std")]
mod std_impls {
    use core::hash::{BuildHasher, Hash};
    use std::collections::{HashMap, HashSet};

    use super::{decode_items, encode_items, set_insert};
    use crate::{Archive, Decoder, Encoder, Insertion, Kind, Result};

    impl_archive_hash_containers!(HashMap, HashSet);
}

// -----------------------------------------------------------------------------
// Tests
