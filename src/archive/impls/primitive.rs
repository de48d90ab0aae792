use crate::{Archive, CorruptedData, Decoder, Encoder, Kind, Result};

macro_rules! impl_archive_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Archive for $ty {
            const KIND: Kind = Kind::Primitive;

            #[inline]
            fn encode(&self, enc: &mut Encoder) {
                enc.write_scalar(*self);
            }

            #[inline]
            fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
                dec.read_scalar::<$ty>()
            }
        }
    )*};
}

impl_archive_scalar!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Archive for usize {
    const KIND: Kind = Kind::Primitive;

    #[inline]
    fn encode(&self, enc: &mut Encoder) {
        enc.write_scalar(*self as u64);
    }

    #[inline]
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let value = dec.read_scalar::<u64>()?;
        usize::try_from(value).map_err(|_| CorruptedData::InvalidValue { what: "usize" })
    }
}

impl Archive for isize {
    const KIND: Kind = Kind::Primitive;

    #[inline]
    fn encode(&self, enc: &mut Encoder) {
        enc.write_scalar(*self as i64);
    }

    #[inline]
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let value = dec.read_scalar::<i64>()?;
        isize::try_from(value).map_err(|_| CorruptedData::InvalidValue { what: "isize" })
    }
}

impl Archive for bool {
    const KIND: Kind = Kind::Primitive;

    #[inline]
    fn encode(&self, enc: &mut Encoder) {
        enc.write_scalar(*self as u8);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        match dec.read_scalar::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CorruptedData::InvalidValue { what: "bool" }),
        }
    }
}

impl Archive for char {
    const KIND: Kind = Kind::Primitive;

    #[inline]
    fn encode(&self, enc: &mut Encoder) {
        enc.write_scalar(*self as u32);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let code = dec.read_scalar::<u32>()?;
        char::from_u32(code).ok_or(CorruptedData::InvalidValue { what: "char" })
    }
}

// -----------------------------------------------------------------------------
// Tests
