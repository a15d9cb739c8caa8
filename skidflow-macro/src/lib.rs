//! Implementation of the `Signal` derive macro.
//!
//! # Note
//!
//! The generated impl refers to `Signal`, `SignalError` and `PortDecls` unqualified, so the
//! deriving module is expected to `use skidflow::*`.
//!
//! For example, the derived `port_decls()` of the following payload
//!
//! ```ignore
//! #[derive(Debug, Clone, PartialEq, Signal)]
//! pub struct Beat {
//!     #[member(name = "")]
//!     data: Bits<32>,
//!     #[member(name = "type")]
//!     typ: Bits<4>,
//! }
//! ```
//!
//! is
//!
//! ```ignore
//! PortDecls::Struct(vec![
//!     (None, PortDecls::Bits(32)),
//!     (Some("type".to_string()), PortDecls::Bits(4)),
//! ])
//! ```

mod signal;
mod utils;

use proc_macro::TokenStream;

#[proc_macro_derive(Signal, attributes(member, width, encode))]
pub fn signal(input: TokenStream) -> TokenStream { signal::derive(input) }
