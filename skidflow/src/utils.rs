//! Utilities.

use std::iter::IntoIterator;

use itertools::Itertools;

macro_rules! impl_to_bits {
    ($($typ:ident),*) => {
        paste::paste! {
            $(
                #[doc = "Returns bit-represented value of a `" $typ "`, LSB first. Bits beyond `N` are dropped."]
                pub fn [<$typ _to_bits>]<const N: usize>(value: $typ) -> [bool; N] {
                    let width = <$typ>::BITS as usize;
                    ::std::array::from_fn(|i| i < width && (value >> i) & 1 != 0)
                }
            )*
        }
    };
}

impl_to_bits!(u8, u16, u32, u64, u128);

/// Renders LSB-first bits as a hex literal. Single bits are rendered as `0` or `1`.
///
/// ### Example
/// ```
/// use skidflow::bits_to_hex;
///
/// assert_eq!(bits_to_hex(&[true]), "1");
/// assert_eq!(bits_to_hex(&[true, false, true, true, false, true]), "0x2d");
/// ```
pub fn bits_to_hex(bits: &[bool]) -> String {
    match bits {
        [] => String::new(),
        [bit] => u8::from(*bit).to_string(),
        _ => {
            let digits = bits
                .chunks(4)
                .rev()
                .map(|nibble| {
                    let value = nibble.iter().rev().fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit));
                    char::from_digit(value, 16).unwrap_or('?')
                })
                .join("");
            format!("0x{}", digits)
        }
    }
}

/// Combines all elements into one String, separated by `sep`. Returns `None` if all elements are `None`.
pub fn join_options<I>(sep: &str, iterable: I) -> Option<String>
where I: IntoIterator<Item = Option<String>> {
    let iterable = iterable.into_iter().flatten().filter(|s| !s.is_empty()).collect::<Vec<_>>();
    if iterable.is_empty() {
        None
    } else {
        Some(iterable.join(sep))
    }
}

/// Some or executing the given expression.
#[macro_export]
macro_rules! some_or {
    ($e:expr, $err:expr) => {{
        match $e {
            Some(r) => r,
            None => $err,
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_bits_truncates_and_pads() {
        assert_eq!(u8_to_bits::<4>(0b1010_0110), [false, true, true, false]);
        assert_eq!(u8_to_bits::<10>(0xff), [true, true, true, true, true, true, true, true, false, false]);
        assert!(u128_to_bits::<200>(u128::MAX)[127]);
        assert!(!u128_to_bits::<200>(u128::MAX)[128]);
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(bits_to_hex(&u32_to_bits::<32>(0xdead_beef)), "0xdeadbeef");
        assert_eq!(bits_to_hex(&u8_to_bits::<5>(0x1f)), "0x1f");
        assert_eq!(bits_to_hex(&[false]), "0");
        assert_eq!(bits_to_hex(&[]), "");
    }

    #[test]
    fn join_options_skips_missing_parts() {
        assert_eq!(join_options("_", [Some("in".to_string()), None, Some("valid".to_string())]), Some("in_valid".to_string()));
        assert_eq!(join_options("_", [Some("in".to_string()), Some(String::new())]), Some("in".to_string()));
        assert_eq!(join_options("_", [None, None]), None);
    }
}
