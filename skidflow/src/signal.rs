//! Bit-representable values.

use std::fmt;
use std::str::FromStr;

use arrayvec::ArrayVec;
use static_assertions::assert_impl_all;

use crate::*;

/// Widest `Bits` value supported.
pub const MAX_WIDTH: usize = 1024;

/// Bit-representable values.
///
/// Bits are ordered LSB first. Compound values concatenate their members in declaration order,
/// which is also the order of `port_decls()`.
pub trait Signal: 'static + fmt::Debug + Clone + PartialEq {
    /// Signal's bit width.
    ///
    /// # Note
    ///
    /// `Self::WIDTH` and `Self::port_decls().width()` should be equal.
    const WIDTH: usize;

    /// Translates the value into `Self::WIDTH` bits.
    fn transl(&self) -> Vec<bool>;

    /// Inverse of `transl`.
    fn try_from_transl(bits: &[bool]) -> Result<Self, SignalError>;

    /// The cleared value, i.e. what a register reads after reset.
    fn zero() -> Self;

    /// Port names and bitwidths.
    ///
    /// # Example
    ///
    /// Port declarations of `Valid<Bits<32>>` are as follows:
    ///
    /// ```ignore
    /// Struct([(Some("data"), Bits(32)), (Some("valid"), Bits(1))])
    /// ```
    fn port_decls() -> PortDecls;
}

/// Port declarations of a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortDecls {
    /// A plain bit vector.
    Bits(usize),

    /// Named members. A `None` name merges the member into its parent.
    Struct(Vec<(Option<String>, PortDecls)>),
}

impl PortDecls {
    /// Total width.
    pub fn width(&self) -> usize {
        match self {
            PortDecls::Bits(width) => *width,
            PortDecls::Struct(inner) => inner.iter().map(|(_, m)| m.width()).sum(),
        }
    }

    /// Flattens into leaf ports, in bit order. Names are joined by `_` under `prefix`.
    pub fn flatten(&self, prefix: Option<String>) -> Vec<(Option<String>, usize)> {
        match self {
            PortDecls::Bits(width) => vec![(prefix, *width)],
            PortDecls::Struct(inner) => inner
                .iter()
                .flat_map(|(name, m)| m.flatten(join_options("_", [prefix.clone(), name.clone()])))
                .collect(),
        }
    }
}

fn check_width<V: Signal>(bits: &[bool]) -> Result<(), SignalError> {
    if bits.len() == V::WIDTH {
        Ok(())
    } else {
        Err(SignalError::WidthMismatch { expected: V::WIDTH, found: bits.len() })
    }
}

impl Signal for () {
    const WIDTH: usize = 0;

    fn transl(&self) -> Vec<bool> { vec![] }

    fn try_from_transl(bits: &[bool]) -> Result<Self, SignalError> { check_width::<Self>(bits) }

    fn zero() -> Self {}

    fn port_decls() -> PortDecls { PortDecls::Bits(0) }
}

impl Signal for bool {
    const WIDTH: usize = 1;

    fn transl(&self) -> Vec<bool> { vec![*self] }

    fn try_from_transl(bits: &[bool]) -> Result<Self, SignalError> {
        check_width::<Self>(bits)?;
        Ok(bits[0])
    }

    fn zero() -> Self { false }

    fn port_decls() -> PortDecls { PortDecls::Bits(1) }
}

macro_rules! impl_signal {
    ($typ:ty) => {
        impl Signal for $typ {
            const WIDTH: usize = <$typ>::BITS as usize;

            fn transl(&self) -> Vec<bool> { (0..Self::WIDTH).map(|i| (*self >> i) & 1 != 0).collect::<Vec<_>>() }

            fn try_from_transl(bits: &[bool]) -> Result<Self, SignalError> {
                check_width::<Self>(bits)?;
                Ok(bits.iter().rev().fold(0, |acc, bit| (acc << 1) | <$typ>::from(*bit)))
            }

            fn zero() -> Self { 0 }

            fn port_decls() -> PortDecls { PortDecls::Bits(Self::WIDTH) }
        }
    };
}

impl_signal!(u8);
impl_signal!(u16);
impl_signal!(u32);
impl_signal!(u64);
impl_signal!(u128);

macro_rules! impl_signal_tuple {
    ($($a:ident $idx:tt)+) => {
        impl<$($a: Signal,)+> Signal for ($($a,)+) {
            const WIDTH: usize = 0 $(+ <$a as Signal>::WIDTH)+;

            fn transl(&self) -> Vec<bool> {
                ::std::iter::empty::<bool>()
                    $(.chain(self.$idx.transl()))+
                    .collect::<Vec<_>>()
            }

            #[allow(unused_assignments)]
            fn try_from_transl(bits: &[bool]) -> Result<Self, SignalError> {
                if bits.len() != Self::WIDTH {
                    return Err(SignalError::WidthMismatch { expected: Self::WIDTH, found: bits.len() });
                }
                let mut offset = 0;
                Ok(($(
                    {
                        let width = <$a as Signal>::WIDTH;
                        let value = <$a as Signal>::try_from_transl(&bits[offset..offset + width])?;
                        offset += width;
                        value
                    },
                )+))
            }

            fn zero() -> Self { ($(<$a as Signal>::zero(),)+) }

            fn port_decls() -> PortDecls {
                PortDecls::Struct(vec![$((Some(stringify!($idx).to_string()), <$a as Signal>::port_decls()),)+])
            }
        }
    };
}

impl_signal_tuple! { V0 0 }
impl_signal_tuple! { V0 0 V1 1 }
impl_signal_tuple! { V0 0 V1 1 V2 2 }
impl_signal_tuple! { V0 0 V1 1 V2 2 V3 3 }

const fn checked_width(width: usize) -> usize {
    assert!(width >= 1 && width <= MAX_WIDTH, "`Bits` width must be in 1..=1024");
    width
}

/// Fixed-width bit vector of `N` bits, `N` in `1..=MAX_WIDTH`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bits<const N: usize>([bool; N]);

impl<const N: usize> Bits<N> {
    const CHECKED_WIDTH: usize = checked_width(N);

    /// Creates bits from an LSB-first array.
    pub fn new(inner: [bool; N]) -> Self {
        let _ = Self::CHECKED_WIDTH;
        Self(inner)
    }

    /// Returns the `index`-th bit.
    pub fn get(&self, index: usize) -> Option<bool> { self.0.get(index).copied() }

    /// LSB-first view of the bits.
    pub fn as_slice(&self) -> &[bool] { &self.0 }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize { self.0.iter().filter(|b| **b).count() }
}

impl<const N: usize> From<[bool; N]> for Bits<N> {
    fn from(inner: [bool; N]) -> Self { Self::new(inner) }
}

macro_rules! impl_bits_from {
    ($($typ:ident),*) => {
        paste::paste! {
            $(
                impl<const N: usize> From<$typ> for Bits<N> {
                    fn from(value: $typ) -> Self { Self::new([<$typ _to_bits>]::<N>(value)) }
                }
            )*
        }
    };
}

impl_bits_from!(u8, u16, u32, u64, u128);

impl<const N: usize> Signal for Bits<N> {
    const WIDTH: usize = checked_width(N);

    fn transl(&self) -> Vec<bool> { self.0.to_vec() }

    fn try_from_transl(bits: &[bool]) -> Result<Self, SignalError> {
        let inner = <[bool; N]>::try_from(bits)
            .map_err(|_| SignalError::WidthMismatch { expected: Self::WIDTH, found: bits.len() })?;
        Ok(Self::new(inner))
    }

    fn zero() -> Self { Self::new([false; N]) }

    fn port_decls() -> PortDecls { PortDecls::Bits(Self::WIDTH) }
}

impl<const N: usize> fmt::LowerHex for Bits<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = bits_to_hex(&self.0);
        let digits = hex.strip_prefix("0x").unwrap_or(&hex);
        if f.alternate() {
            write!(f, "0x{}", digits)
        } else {
            write!(f, "{}", digits)
        }
    }
}

impl<const N: usize> fmt::Display for Bits<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self) }
}

impl<const N: usize> fmt::Debug for Bits<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Bits<{}>({:#x})", N, self) }
}

impl<const N: usize> FromStr for Bits<N> {
    type Err = SignalError;

    /// Parses a hex literal with an optional `0x` prefix and `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SignalError::InvalidHex { input: s.to_string() };
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

        // Leading zeros are not stored, so only significant digits count against the capacity.
        let mut nibbles = ArrayVec::<u8, { MAX_WIDTH / 4 }>::new();
        let mut seen = false;
        for c in digits.chars().filter(|c| *c != '_') {
            let nibble = c.to_digit(16).ok_or_else(invalid)?;
            seen = true;
            if nibbles.is_empty() && nibble == 0 {
                continue;
            }
            nibbles.try_push(nibble as u8).map_err(|_| invalid())?;
        }
        if !seen {
            return Err(invalid());
        }

        let mut bits = [false; N];
        for (i, nibble) in nibbles.iter().rev().enumerate() {
            for j in 0..4 {
                let set = (nibble >> j) & 1 != 0;
                match bits.get_mut(i * 4 + j) {
                    Some(bit) => *bit = set,
                    // Literal does not fit in `N` bits.
                    None if set => return Err(invalid()),
                    None => {}
                }
            }
        }
        Ok(Self::new(bits))
    }
}

assert_impl_all!(Bits<MAX_WIDTH>: Signal, Send, Sync, FromStr);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_widths_and_bit_order() {
        assert_eq!(u8::WIDTH, 8);
        assert_eq!(u128::WIDTH, 128);
        assert_eq!(0x81u8.transl(), vec![true, false, false, false, false, false, false, true]);
        assert_eq!(u16::try_from_transl(&0xbeefu16.transl()), Ok(0xbeef));
        assert_eq!(<(bool, u8)>::WIDTH, 9);
        assert_eq!(<(bool, u8)>::try_from_transl(&(true, 0x5au8).transl()), Ok((true, 0x5a)));
    }

    #[test]
    fn width_mismatch_is_an_error() {
        assert_eq!(u8::try_from_transl(&[true; 7]), Err(SignalError::WidthMismatch { expected: 8, found: 7 }));
        assert_eq!(
            Bits::<32>::try_from_transl(&[false; 33]),
            Err(SignalError::WidthMismatch { expected: 32, found: 33 })
        );
    }

    #[test]
    fn bits_from_integers() {
        let bits = Bits::<32>::from(0xdead_beefu32);
        assert_eq!(format!("{}", bits), "0xdeadbeef");
        assert_eq!(format!("{:x}", bits), "deadbeef");
        assert_eq!(format!("{:?}", bits), "Bits<32>(0xdeadbeef)");
        assert_eq!(bits.count_ones(), 24);
        assert_eq!(Bits::<4>::from(0xffu8), Bits::new([true; 4]));
        assert_eq!(Bits::<1024>::zero().count_ones(), 0);
    }

    #[test]
    fn bits_parse_hex() {
        assert_eq!("0xCAFE_BABE".parse::<Bits<32>>(), Ok(Bits::from(0xcafe_babeu32)));
        assert_eq!("1".parse::<Bits<1>>(), Ok(Bits::new([true])));
        assert_eq!("0x0001".parse::<Bits<1>>(), Ok(Bits::new([true])));
        assert_eq!("0x1ff".parse::<Bits<8>>(), Err(SignalError::InvalidHex { input: "0x1ff".to_string() }));
        assert!("0xg".parse::<Bits<8>>().is_err());
        assert!("0x".parse::<Bits<8>>().is_err());

        let wide = format!("0x8{}", "0".repeat(255));
        let bits = wide.parse::<Bits<1024>>().unwrap();
        assert_eq!(bits.get(1023), Some(true));
        assert_eq!(bits.count_ones(), 1);
    }

    #[test]
    fn bits_parse_ignores_leading_zeros() {
        let padded = format!("0x{}1", "0".repeat(300));
        assert_eq!(padded.parse::<Bits<1024>>(), Ok(Bits::from(1u8)));
        assert_eq!(format!("0x{}", "0".repeat(400)).parse::<Bits<1024>>(), Ok(Bits::zero()));
        assert_eq!("0x0000_0000".parse::<Bits<4>>(), Ok(Bits::zero()));
        assert_eq!("0".parse::<Bits<1>>(), Ok(Bits::new([false])));
        assert!(format!("0x1{}", "0".repeat(256)).parse::<Bits<1024>>().is_err());
    }

    #[test]
    fn port_decls_flatten_with_prefix() {
        let decls = PortDecls::Struct(vec![
            (Some("data".to_string()), PortDecls::Bits(32)),
            (None, PortDecls::Struct(vec![(Some("last".to_string()), PortDecls::Bits(1))])),
            (Some("valid".to_string()), PortDecls::Bits(1)),
        ]);
        assert_eq!(decls.width(), 34);
        assert_eq!(decls.flatten(Some("in".to_string())), vec![
            (Some("in_data".to_string()), 32),
            (Some("in_last".to_string()), 1),
            (Some("in_valid".to_string()), 1),
        ]);
        assert_eq!(<(u8, bool)>::port_decls().flatten(None), vec![(Some("0".to_string()), 8), (Some("1".to_string()), 1)]);
    }
}
