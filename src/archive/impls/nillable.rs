use crate::{Archive, CorruptedData, Decoder, Encoder, Kind, Result};

// -----------------------------------------------------------------------------
// Option

fn read_presence(dec: &mut Decoder<'_>) -> Result<bool> {
    match dec.read_scalar::<u8>()? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CorruptedData::InvalidValue { what: "presence byte" }),
    }
}

impl<T: Archive> Archive for Option<T> {
    const KIND: Kind = Kind::Nillable;

    fn encode(&self, enc: &mut Encoder) {
        match self {
            Some(value) => {
                enc.write_scalar(1_u8);
                value.encode(enc);
            }
            None => enc.write_scalar(0_u8),
        }
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        if read_presence(dec)? {
            T::decode(dec).map(Some)
        } else {
            Ok(None)
        }
    }

    fn decode_in_place(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let present = read_presence(dec)?;
        match self {
            Some(value) if present => value.decode_in_place(dec),
            _ if present => {
                *self = Some(T::decode(dec)?);
                Ok(())
            }
            _ => {
                *self = None;
                Ok(())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
