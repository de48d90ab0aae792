//! End-to-end behavior through the public entry points.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::{Archive, ArchiveConfig, CorruptedData, DuplicateKeys, HEADER_SIZE, Header};
use crate::{Interior, Poly, Polymorphic};
use crate::{decode_payload, deserialize, deserialize_into, deserialize_with};
use crate::{encode_payload, integrity_count, serialize};

mod fixtures {
    use super::*;

    #[derive(Archive, Debug, PartialEq)]
    pub struct Inner {
        pub x: i32,
        pub y: i32,
        pub z: Vec<i32>,
    }

    #[derive(Archive, Debug, PartialEq)]
    pub struct Example {
        pub a: Option<i32>,
        pub b: BTreeMap<i32, i32>,
        pub c: Inner,
        pub d: String,
    }

    pub fn example() -> Example {
        Example {
            a: None,
            b: BTreeMap::from([(1, 2), (2, 3)]),
            c: Inner {
                x: 1,
                y: 2,
                z: vec![2, 3],
            },
            d: String::from("b"),
        }
    }
}

use fixtures::{Example, example};

// -----------------------------------------------------------------------------
// Round trips

#[test]
fn reflectible_round_trip_has_fixed_length() {
    let value = example();
    let bytes = serialize(&value);

    // header + presence + map(count + 2 pairs) + inner(x, y, count + 2) + string(count + 1)
    let expected = HEADER_SIZE + 1 + (8 + 2 * (4 + 4)) + (4 + 4 + 8 + 2 * 4) + (8 + 1);
    assert_eq!(bytes.len(), expected);
    assert_eq!(bytes.len(), 74);
    assert_eq!(integrity_count(&value), 74);
    assert_eq!(deserialize::<Example>(&bytes), Ok(value));
}

#[test]
fn serialization_is_deterministic() {
    assert_eq!(serialize(&example()), serialize(&example()));
}

#[derive(Archive, Debug, PartialEq, Clone)]
struct Wrapper<T> {
    inner: T,
    count: u32,
}

#[derive(Archive, Debug, PartialEq)]
struct Meters(f64, u8);

#[derive(Archive, Debug, PartialEq)]
struct Marker;

#[test]
fn derived_shapes() {
    let wrapped = Wrapper {
        inner: Some(String::from("w")),
        count: 2,
    };
    assert_eq!(deserialize(&serialize(&wrapped)), Ok(wrapped));

    let meters = Meters(2.5, 1);
    assert_eq!(encode_payload(&meters).len(), 9);
    assert_eq!(deserialize(&serialize(&meters)), Ok(meters));

    assert!(encode_payload(&Marker).is_empty());
    assert_eq!(deserialize(&serialize(&Marker)), Ok(Marker));

    let nested = Wrapper {
        inner: Wrapper { inner: [1_u8, 2], count: 0 },
        count: 1,
    };
    assert_eq!(deserialize(&serialize(&nested)), Ok(nested));
}

// -----------------------------------------------------------------------------
// Corruption

#[test]
fn every_single_bit_flip_is_detected() {
    let bytes = serialize(&example());
    for byte in HEADER_SIZE..bytes.len() {
        for bit in 0..8 {
            let mut damaged = bytes.clone();
            damaged[byte] ^= 1 << bit;
            assert!(
                matches!(
                    deserialize::<Example>(&damaged),
                    Err(CorruptedData::ChecksumMismatch { .. })
                ),
                "flip of bit {bit} in byte {byte} went unnoticed",
            );
        }
    }
}

#[test]
fn every_truncation_is_detected() {
    let bytes = serialize(&example());
    for len in 0..bytes.len() {
        let result = deserialize::<Example>(&bytes[..len]);
        assert!(
            matches!(
                result,
                Err(CorruptedData::HeaderTooShort { .. } | CorruptedData::LengthMismatch { .. })
            ),
            "truncation to {len} bytes went unnoticed",
        );
    }
}

/// Wraps a hand-built payload in a valid header.
fn seal(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0; HEADER_SIZE];
    Header::for_payload(payload).write(&mut bytes);
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn duplicate_keys_follow_policy() {
    let mut payload = Vec::from(2_u64.to_le_bytes());
    payload.extend_from_slice(&[5, 1, 5, 2]);
    let bytes = seal(&payload);

    let lenient = deserialize::<BTreeMap<u8, u8>>(&bytes).unwrap();
    assert_eq!(lenient, BTreeMap::from([(5, 1)]));

    let strict = ArchiveConfig::DEFAULT.with_duplicate_keys(DuplicateKeys::Reject);
    assert_eq!(
        deserialize_with::<BTreeMap<u8, u8>>(&bytes, strict),
        Err(CorruptedData::DuplicateKey)
    );
}

#[test]
fn sealed_but_short_payload() {
    let bytes = seal(&[1, 2]);
    assert_eq!(
        deserialize::<u32>(&bytes),
        Err(CorruptedData::UnexpectedEof {
            needed: 4,
            available: 2
        })
    );
}

// -----------------------------------------------------------------------------
// Pointer graphs

#[derive(Archive, Debug, PartialEq)]
struct Node {
    value: u32,
}

#[derive(Archive)]
struct Graph {
    first: Rc<Node>,
    second: Rc<Node>,
}

#[test]
fn aliases_written_once_and_shared_after() {
    let node = Rc::new(Node { value: 11 });
    let graph = Graph {
        first: node.clone(),
        second: node,
    };

    let mut expected = vec![1];
    expected.extend_from_slice(&11_u32.to_le_bytes());
    expected.push(2);
    expected.extend_from_slice(&0_u64.to_le_bytes());
    assert_eq!(encode_payload(&graph), expected);

    let back = deserialize::<Graph>(&serialize(&graph)).unwrap();
    assert!(Rc::ptr_eq(&back.first, &back.second));
    assert_eq!(back.first.value, 11);
}

#[test]
fn distinct_equal_values_stay_distinct() {
    let graph = Graph {
        first: Rc::new(Node { value: 1 }),
        second: Rc::new(Node { value: 1 }),
    };
    let back = deserialize::<Graph>(&serialize(&graph)).unwrap();
    assert!(!Rc::ptr_eq(&back.first, &back.second));
    assert_eq!(back.first, back.second);
}

#[derive(Archive)]
struct Buffer {
    cursor: Interior<u32>,
    data: Rc<[u32]>,
    tail: Interior<u32>,
}

#[test]
fn interior_pointers_rebind_into_the_block() {
    let data: Rc<[u32]> = Rc::from([10, 20, 30, 40]);
    let buffer = Buffer {
        cursor: Interior::new(&data, 2),
        tail: Interior::new(&data, 3),
        data,
    };

    let payload = encode_payload(&buffer);
    // block: tag + count + 4 elements, then (id, offset) per interior pointer
    assert_eq!(payload.len(), 1 + 8 + 16 + 2 * 16);
    assert_eq!(&payload[25..33], &0_u64.to_le_bytes());
    assert_eq!(&payload[33..41], &8_u64.to_le_bytes());
    assert_eq!(&payload[49..57], &12_u64.to_le_bytes());

    let back = deserialize::<Buffer>(&serialize(&buffer)).unwrap();
    assert!(back.cursor.points_into(&back.data));
    assert!(back.tail.points_into(&back.data));
    assert_eq!((back.cursor.index(), *back.cursor), (2, 30));
    assert_eq!((back.tail.index(), *back.tail), (3, 40));
}

#[test]
fn interior_pointer_to_a_single_allocation() {
    let node = Rc::new(Node { value: 5 });
    let value = (Interior::to(&node), vec![node]);
    let (view, nodes) = deserialize::<(Interior<Node>, Vec<Rc<Node>>)>(&serialize(&value)).unwrap();
    assert_eq!(view.value, 5);
    assert!(view.block().is_none());
    assert_eq!(nodes[0].value, 5);
}

#[test]
#[should_panic(expected = "outside every archived allocation")]
fn interior_pointer_without_its_block() {
    let data: Rc<[u32]> = Rc::from([1, 2]);
    let _ = serialize(&Interior::new(&data, 1));
}

#[derive(Archive)]
struct Holder {
    left: Rc<Vec<u8>>,
    right: Rc<Vec<u8>>,
    label: Option<String>,
    boxed: Box<u16>,
}

#[test]
fn decoding_in_place_releases_each_allocation_once() {
    let old = Rc::new(vec![1, 2]);
    let old_weak = Rc::downgrade(&old);
    let mut target = Holder {
        left: old.clone(),
        right: old,
        label: None,
        boxed: Box::new(1),
    };

    let fresh = Rc::new(vec![9]);
    let source = Holder {
        left: fresh.clone(),
        right: fresh,
        label: Some(String::from("new")),
        boxed: Box::new(2),
    };

    deserialize_into(&mut target, &serialize(&source)).unwrap();

    assert!(old_weak.upgrade().is_none());
    assert!(Rc::ptr_eq(&target.left, &target.right));
    assert_eq!(*target.left, vec![9]);
    assert_eq!(target.label.as_deref(), Some("new"));
    assert_eq!(*target.boxed, 2);
}

#[test]
fn decoding_in_place_rejects_corruption_untouched() {
    let mut target = Wrapper {
        inner: 1_u8,
        count: 1,
    };
    let mut bytes = serialize(&Wrapper { inner: 2_u8, count: 2 });
    bytes[HEADER_SIZE] ^= 1;

    assert!(deserialize_into(&mut target, &bytes).is_err());
    assert_eq!(target, Wrapper { inner: 1, count: 1 });
}

#[test]
fn failed_decode_in_place_keeps_earlier_fields() {
    let mut target = Wrapper {
        inner: String::from("old"),
        count: 1,
    };

    // a whole string, then two of the four count bytes
    let mut payload = Vec::from(3_u64.to_le_bytes());
    payload.extend_from_slice(b"new");
    payload.extend_from_slice(&[2, 0]);

    assert_eq!(
        deserialize_into(&mut target, &seal(&payload)),
        Err(CorruptedData::UnexpectedEof {
            needed: 4,
            available: 2
        })
    );
    assert_eq!(target.inner, "new");
    assert_eq!(target.count, 1);
}

#[test]
fn atomic_blocks_share_one_allocation() {
    let block: Arc<[u64]> = Arc::from([1, 2, 3]);
    let value = (block.clone(), Some(block));

    let bytes = serialize(&value);
    let (a, b) = deserialize::<(Arc<[u64]>, Option<Arc<[u64]>>)>(&bytes).unwrap();
    assert_eq!(&*a, &[1, 2, 3]);
    assert!(b.is_some_and(|b| Arc::ptr_eq(&a, &b)));
}

// -----------------------------------------------------------------------------
// Polymorphism

trait Shape: Polymorphic {
    fn corners(&self) -> u32;
}

#[derive(Archive, Debug, PartialEq)]
struct Blob;

#[derive(Archive, Debug, PartialEq)]
struct Triangle {
    base: f32,
}

#[derive(Archive, Debug, PartialEq)]
struct Square {
    side: f32,
}

#[derive(Archive, Debug, PartialEq)]
struct Tile {
    square: Square,
    pattern: String,
}

impl Shape for Blob {
    fn corners(&self) -> u32 {
        0
    }
}

impl Shape for Triangle {
    fn corners(&self) -> u32 {
        3
    }
}

impl Shape for Square {
    fn corners(&self) -> u32 {
        4
    }
}

impl Shape for Tile {
    fn corners(&self) -> u32 {
        4
    }
}

crate::hierarchy! {
    dyn Shape => [
        Blob;
        Triangle: Blob;
        Square: Blob;
        Tile: Square;
    ]
}

#[derive(Archive)]
struct Scene {
    shapes: Vec<Poly<dyn Shape>>,
    focus: Poly<dyn Shape>,
    empty: Poly<dyn Shape>,
}

#[test]
fn base_pointer_rebuilds_most_derived_class() {
    let tile: Rc<dyn Shape> = Rc::new(Tile {
        square: Square { side: 2.0 },
        pattern: String::from("checker"),
    });
    let scene = Scene {
        shapes: vec![
            Poly::new(Rc::new(Triangle { base: 1.0 })),
            Poly::new(tile.clone()),
            Poly::new(Rc::new(Blob)),
        ],
        focus: Poly::new(tile),
        empty: Poly::null(),
    };

    let back = deserialize::<Scene>(&serialize(&scene)).unwrap();

    assert!(back.shapes[0].is::<Triangle>());
    assert!(back.shapes[1].is::<Tile>());
    assert!(!back.shapes[1].is::<Square>());
    assert!(back.shapes[2].is::<Blob>());
    assert_eq!(
        back.focus.downcast_ref::<Tile>().map(|t| t.pattern.as_str()),
        Some("checker")
    );
    assert!(back.focus.ptr_eq(&back.shapes[1]));
    assert!(back.empty.is_null());

    let corners: Vec<_> = back.shapes.iter().filter_map(|s| s.get().map(Shape::corners)).collect();
    assert_eq!(corners, [3, 4, 0]);
}

#[test]
fn shared_graph_decodes_with_matching_allocation_count() {
    let shared = Rc::new(Node { value: 3 });
    let value = (vec![shared.clone(), shared.clone()], Box::new(shared), Rc::new(0_u8));
    let payload = encode_payload(&value);

    let mut dec = crate::Decoder::new(&payload, ArchiveConfig::DEFAULT);
    let back = <(Vec<Rc<Node>>, Box<Rc<Node>>, Rc<u8>)>::decode(&mut dec).unwrap();
    assert_eq!(dec.allocations(), 3);
    assert!(Rc::ptr_eq(&back.0[1], &back.1));
    assert!(dec.finish().is_ok());
    assert_eq!(decode_payload::<(Vec<Rc<Node>>, Box<Rc<Node>>, Rc<u8>)>(&payload).map(|v| *v.2), Ok(0));
}

#[derive(Archive)]
struct Mixed {
    concrete: Rc<Triangle>,
    erased: Poly<dyn Shape>,
}

#[derive(Archive)]
struct MixedReversed {
    erased: Poly<dyn Shape>,
    concrete: Rc<Triangle>,
}

fn same_allocation(concrete: &Rc<Triangle>, erased: &Poly<dyn Shape>) -> bool {
    erased
        .as_rc()
        .is_some_and(|rc| core::ptr::addr_eq(Rc::as_ptr(rc), Rc::as_ptr(concrete)))
}

#[test]
fn concrete_then_polymorphic_alias() {
    let triangle = Rc::new(Triangle { base: 1.5 });
    let value = Mixed {
        concrete: triangle.clone(),
        erased: Poly::new(triangle),
    };

    let mut expected = vec![1];
    expected.extend_from_slice(&1.5_f32.to_le_bytes());
    expected.push(2);
    expected.extend_from_slice(&0_u64.to_le_bytes());
    assert_eq!(encode_payload(&value), expected);

    let back = deserialize::<Mixed>(&serialize(&value)).unwrap();
    assert!(back.erased.is::<Triangle>());
    assert!(same_allocation(&back.concrete, &back.erased));
}

#[test]
fn polymorphic_then_concrete_alias() {
    let triangle = Rc::new(Triangle { base: 2.5 });
    let value = MixedReversed {
        erased: Poly::new(triangle.clone()),
        concrete: triangle,
    };

    let back = deserialize::<MixedReversed>(&serialize(&value)).unwrap();
    assert_eq!(back.concrete.base, 2.5);
    assert!(same_allocation(&back.concrete, &back.erased));
}

#[derive(Archive)]
struct Stage {
    lead: Poly<dyn Shape>,
    understudy: Poly<dyn Shape>,
}

#[test]
fn polymorphic_fields_decoded_in_place() {
    let old: Rc<dyn Shape> = Rc::new(Square { side: 1.0 });
    let old_weak = Rc::downgrade(&old);
    let mut target = Stage {
        lead: Poly::new(old.clone()),
        understudy: Poly::new(old),
    };

    let source = Stage {
        lead: Poly::new(Rc::new(Triangle { base: 2.0 })),
        understudy: Poly::null(),
    };
    deserialize_into(&mut target, &serialize(&source)).unwrap();

    assert!(old_weak.upgrade().is_none());
    assert_eq!(target.lead.downcast_ref::<Triangle>(), Some(&Triangle { base: 2.0 }));
    assert!(target.understudy.is_null());
}
