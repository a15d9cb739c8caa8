use syn::{Attribute, Ident, Lit, LitInt, Meta, NestedMeta};

/// Returns the nested meta items of `#[<name>(...)]` attributes.
fn list_items<'a>(attrs: &'a [Attribute], name: &'a str) -> impl Iterator<Item = NestedMeta> + 'a {
    attrs.iter().filter_map(move |attr| match attr.parse_meta() {
        Ok(Meta::List(list)) if list.path.is_ident(name) => Some(list.nested.into_iter()),
        _ => None,
    })
    .flatten()
}

fn first_int(attrs: &[Attribute], name: &str) -> Option<LitInt> {
    list_items(attrs, name).find_map(|item| match item {
        NestedMeta::Lit(Lit::Int(value)) => Some(value),
        _ => None,
    })
}

/// `#[width(N)]` on an enum.
pub(super) fn get_enum_width(attrs: &[Attribute]) -> Option<LitInt> { first_int(attrs, "width") }

/// `#[encode(N)]` on an enum variant.
pub(super) fn get_enum_encode_value(attrs: &[Attribute]) -> Option<LitInt> { first_int(attrs, "encode") }

/// Port name of a struct member.
///
/// Defaults to the field name; `#[member(name = "")]` makes the member anonymous, so its ports
/// are named after the enclosing struct only.
pub(super) fn get_member_symbol(attrs: &[Attribute], name: &Ident) -> Option<Lit> {
    let symbol = list_items(attrs, "member").find_map(|item| match item {
        NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("name") => Some(nv.lit),
        _ => None,
    });

    match symbol {
        None => Some(Lit::new(proc_macro2::Literal::string(&name.to_string()))),
        Some(Lit::Str(s)) if s.value().is_empty() => None,
        Some(lit @ Lit::Str(_)) => Some(lit),
        Some(lit) => panic!("{name}: expected string member name, found {:?}", lit),
    }
}

/// Ceiling log2, as used for enum widths.
pub(super) fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (::std::mem::size_of::<usize>() * 8) - (value - 1).leading_zeros() as usize
    }
}
