use alloc::vec::Vec;

use crate::{Archive, CorruptedData, Decoder, Encoder, Kind, Result};

// -----------------------------------------------------------------------------
// Tuples

macro_rules! impl_archive_tuple {
    ($($name:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($name: Archive),*> Archive for ($($name,)*) {
            const KIND: Kind = Kind::TupleLike;

            #[inline]
            fn encode(&self, enc: &mut Encoder) {
                let ($($name,)*) = self;
                $($name.encode(enc);)*
            }

            #[inline]
            fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
                Ok(($($name::decode(dec)?,)*))
            }

            fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
                let ($($name,)*) = self;
                $($name.decode_in_place(dec)?;)*
                Ok(())
            }
        }
    };
}

impl_archive_tuple!();
impl_archive_tuple!(P0);
impl_archive_tuple!(P0, P1);
impl_archive_tuple!(P0, P1, P2);
impl_archive_tuple!(P0, P1, P2, P3);
impl_archive_tuple!(P0, P1, P2, P3, P4);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5, P6);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5, P6, P7);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5, P6, P7, P8);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5, P6, P7, P8, P9);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5, P6, P7, P8, P9, P10);
impl_archive_tuple!(P0, P1, P2, P3, P4, P5, P6, P7, P8, P9, P10, P11);

// -----------------------------------------------------------------------------
// Arrays

impl<T: Archive, const N: usize> Archive for [T; N] {
    const KIND: Kind = Kind::TupleLike;

    fn encode(&self, enc: &mut Encoder) {
        for item in self {
            item.encode(enc);
        }
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(dec)?);
        }
        items
            .try_into()
            .map_err(|_| CorruptedData::InvalidValue { what: "array length" })
    }

    fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        for item in self {
            item.decode_in_place(dec)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use crate::{decode_payload, encode_payload};

    #[test]
    fn positions_in_declared_order() {
        assert_eq!(encode_payload(&(1_u8, 2_u16, 3_u8)), [1, 2, 0, 3]);
        assert_eq!(encode_payload(&[4_u8, 5, 6]), [4, 5, 6]);
        assert!(encode_payload(&()).is_empty());
    }

    #[test]
    fn round_trip() {
        let value = (1_u8, -2_i64, String::from("x"), [true, false], ((), 'q'));
        assert_eq!(decode_payload(&encode_payload(&value)), Ok(value));

        let wide = (0_u8, 1_u8, 2_u8, 3_u8, 4_u8, 5_u8, 6_u8, 7_u8, 8_u8, 9_u8, 10_u8, 11_u8);
        assert_eq!(decode_payload(&encode_payload(&wide)), Ok(wide));
    }
}
