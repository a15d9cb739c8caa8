use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use super::utils::{clog2, get_enum_encode_value, get_enum_width, get_member_symbol};

pub fn derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let name = &ast.ident;
    match ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { ref named, .. }), ..
        }) => {
            let fields = named;
            let idents = fields.iter().map(|f| f.ident.as_ref().unwrap()).collect::<Vec<_>>();

            let ty_widths = fields.iter().map(|f| {
                let ty = &f.ty;
                quote! { <#ty as Signal>::WIDTH }
            });

            // fields for `transl`.
            let transl_fields = idents.iter().map(|name| quote! { .chain(Signal::transl(&self.#name)) });

            // fields for `try_from_transl`, consumed LSB first in declaration order.
            let from_fields = fields.iter().map(|f| {
                let name = &f.ident;
                let ty = &f.ty;
                quote! {
                    let #name = {
                        let width = <#ty as Signal>::WIDTH;
                        let value = <#ty as Signal>::try_from_transl(&__bits[__offset..__offset + width])?;
                        __offset += width;
                        value
                    };
                }
            });

            let zero_fields = fields.iter().map(|f| {
                let name = &f.ident;
                let ty = &f.ty;
                quote! { #name: <#ty as Signal>::zero() }
            });

            // fields for `port_decls`.
            let port_decls_fields = fields.iter().map(|f| {
                let name = f.ident.as_ref().unwrap();
                let ty = &f.ty;
                let symbol = get_member_symbol(&f.attrs, name);

                match symbol {
                    None => quote! { (None, <#ty as Signal>::port_decls()) },
                    Some(symbol) => quote! { (Some(#symbol.to_string()), <#ty as Signal>::port_decls()) },
                }
            });

            let expanded = quote! {
                impl #impl_generics Signal for #name #ty_generics #where_clause {
                    const WIDTH: usize = 0 #(+ #ty_widths)*;

                    fn transl(&self) -> Vec<bool> {
                        ::std::iter::empty::<bool>()#(#transl_fields)*.collect::<Vec<bool>>()
                    }

                    #[allow(unused_assignments, unused_mut, unused_variables)]
                    fn try_from_transl(__bits: &[bool]) -> Result<Self, SignalError> {
                        if __bits.len() != Self::WIDTH {
                            return Err(SignalError::WidthMismatch { expected: Self::WIDTH, found: __bits.len() });
                        }
                        let mut __offset = 0usize;
                        #(#from_fields)*
                        Ok(Self { #(#idents,)* })
                    }

                    fn zero() -> Self {
                        Self { #(#zero_fields,)* }
                    }

                    fn port_decls() -> PortDecls {
                        PortDecls::Struct(vec![
                            #(#port_decls_fields,)*
                        ])
                    }
                }
            };

            expanded.into()
        }
        syn::Data::Enum(syn::DataEnum { ref variants, .. }) => {
            let variant_count = variants.iter().count();
            assert!(variant_count > 0, "{name}: Empty enums cannot be derived as skidflow `Signal`");
            let width = if let Some(width) = get_enum_width(&ast.attrs) {
                width.base10_parse::<usize>().unwrap_or_else(|_| panic!("{name}: Enum width should be usize"))
            } else if variant_count == 1 {
                1
            } else {
                clog2(variant_count)
            };

            let encodings = variants
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let variant_name = &f.ident;
                    assert!(
                        matches!(f.fields, syn::Fields::Unit),
                        "{name}::{variant_name}: Only Unit Variant is allowed to be derived as skidflow Signal"
                    );

                    let encode_value = if let Some(encode_value_lit) = get_enum_encode_value(&f.attrs) {
                        encode_value_lit
                            .base10_parse::<usize>()
                            .unwrap_or_else(|_| panic!("encoding value of {name}::{variant_name} should be usize"))
                    } else {
                        i
                    };
                    assert!(
                        width >= usize::BITS as usize || encode_value < (1 << width),
                        "{encode_value}(encoding of {name}::{variant_name}) exceeds maximum for {width} bits",
                    );

                    (variant_name, encode_value)
                })
                .collect::<Vec<_>>();

            let name_str = name.to_string();
            let first_variant = encodings[0].0;

            let into_variants = encodings.iter().map(|(variant_name, encode_value)| {
                quote! {
                    Self::#variant_name => (0..#width)
                        .map(|idx| #encode_value.checked_shr(idx as u32).map_or(false, |v| v & 1 != 0))
                        .collect::<Vec<bool>>(),
                }
            });

            let from_variants = encodings.iter().map(|(variant_name, encode_value)| {
                quote! { #encode_value => Ok(Self::#variant_name), }
            });

            let expanded = quote! {
                impl #impl_generics Signal for #name #ty_generics #where_clause {
                    const WIDTH: usize = #width;

                    fn transl(&self) -> Vec<bool> {
                        match self {
                            #(#into_variants)*
                        }
                    }

                    fn try_from_transl(__bits: &[bool]) -> Result<Self, SignalError> {
                        if __bits.len() != Self::WIDTH {
                            return Err(SignalError::WidthMismatch { expected: Self::WIDTH, found: __bits.len() });
                        }
                        let mut __value = 0usize;
                        for (idx, bit) in __bits.iter().enumerate() {
                            if !*bit {
                                continue;
                            }
                            if idx >= usize::BITS as usize {
                                return Err(SignalError::InvalidEncoding { typ: #name_str, value: usize::MAX });
                            }
                            __value |= 1 << idx;
                        }
                        match __value {
                            #(#from_variants)*
                            _ => Err(SignalError::InvalidEncoding { typ: #name_str, value: __value }),
                        }
                    }

                    fn zero() -> Self { Self::#first_variant }

                    fn port_decls() -> PortDecls { PortDecls::Bits(Self::WIDTH) }
                }
            };

            expanded.into()
        }
        _ => todo!("Signal macro is not implemented for union type"),
    }
}
