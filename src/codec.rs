//! Fixed-width scalars in the canonical wire byte order.
//!
//! The wire order is little-endian. A scalar is first laid out the way the
//! host stores it, then [`normalize`]d, so the branch that reverses bytes on
//! big-endian hosts can be exercised on any machine by naming the host order
//! explicitly (see [`Scalar::dump_on`]).

// -----------------------------------------------------------------------------
// Endian

/// A byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of every archived scalar.
    pub const WIRE: Endian = Endian::Little;

    /// Byte order of the compiling target.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;

    /// Byte order of the compiling target.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;
}

/// Converts between `host` order and wire order in place.
///
/// The conversion is its own inverse.
#[inline]
pub fn normalize(bytes: &mut [u8], host: Endian) {
    if host != Endian::WIRE {
        bytes.reverse();
    }
}

// -----------------------------------------------------------------------------
// Scalar

/// Largest [`Scalar::WIDTH`].
const MAX_WIDTH: usize = 16;

/// A fixed-width arithmetic value.
///
/// Buffer bounds are the caller's contract: `dump` and `load` panic when the
/// slice is shorter than [`Scalar::WIDTH`].
pub trait Scalar: Copy {
    const WIDTH: usize;

    /// Lays out `self` as a host with order `host` would store it.
    fn to_host(self, host: Endian, dst: &mut [u8]);

    /// Reads a value laid out in `host` order.
    fn from_host(host: Endian, src: &[u8]) -> Self;

    /// Writes `self` in wire order, as a host with order `host` would.
    #[inline]
    fn dump_on(self, host: Endian, dst: &mut [u8]) {
        let dst = &mut dst[..Self::WIDTH];
        self.to_host(host, dst);
        normalize(dst, host);
    }

    /// Reads a wire-order value, as a host with order `host` would.
    #[inline]
    fn load_on(host: Endian, src: &[u8]) -> Self {
        let mut buf = [0_u8; MAX_WIDTH];
        let buf = &mut buf[..Self::WIDTH];
        buf.copy_from_slice(&src[..Self::WIDTH]);
        normalize(buf, host);
        Self::from_host(host, buf)
    }

    #[inline]
    fn dump(self, dst: &mut [u8]) {
        self.dump_on(Endian::NATIVE, dst);
    }

    #[inline]
    fn load(src: &[u8]) -> Self {
        Self::load_on(Endian::NATIVE, src)
    }
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const WIDTH: usize = size_of::<$ty>();

            #[inline]
            fn to_host(self, host: Endian, dst: &mut [u8]) {
                let bytes = match host {
                    Endian::Little => self.to_le_bytes(),
                    Endian::Big => self.to_be_bytes(),
                };
                dst[..Self::WIDTH].copy_from_slice(&bytes);
            }

            #[inline]
            fn from_host(host: Endian, src: &[u8]) -> Self {
                let mut bytes = [0_u8; size_of::<$ty>()];
                bytes.copy_from_slice(&src[..Self::WIDTH]);
                match host {
                    Endian::Little => <$ty>::from_le_bytes(bytes),
                    Endian::Big => <$ty>::from_be_bytes(bytes),
                }
            }
        }
    )*};
}

impl_scalar!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// -----------------------------------------------------------------------------
// Tests
