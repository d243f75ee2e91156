//! Proc macro for deriving the `Wire` trait in wirebin.
//!
//! Generates the static shape constant plus the mirror and field-access
//! impls. Field attributes: `#[wire(ignore)]`, `#[wire(packed)]`. Struct
//! attribute: `#[wire(serializer)]`, which wires the type's `Serializer`
//! impl into its shape.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, GenericParam, parse_macro_input, parse_quote};

/// Derives `wirebin::Wire` for a struct with named fields (or no fields).
#[proc_macro_derive(Wire, attributes(wire))]
pub fn derive_wire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

#[derive(Default)]
struct Tags {
    ignore: bool,
    packed: bool,
    serializer: bool,
}

fn parse_tags(attrs: &[syn::Attribute]) -> syn::Result<Tags> {
    let mut tags = Tags::default();
    for attr in attrs {
        if !attr.path().is_ident("wire") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                tags.ignore = true;
                Ok(())
            } else if meta.path.is_ident("packed") {
                tags.packed = true;
                Ok(())
            } else if meta.path.is_ident("serializer") {
                tags.serializer = true;
                Ok(())
            } else {
                Err(meta.error("expected `ignore`, `packed`, or `serializer`"))
            }
        })?;
    }
    Ok(tags)
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let ident_str = ident.to_string();

    for param in &input.generics.params {
        if let GenericParam::Lifetime(lifetime) = param {
            return Err(syn::Error::new_spanned(
                lifetime,
                "Wire cannot be derived for types with lifetime parameters",
            ));
        }
    }

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Wire can only be derived for structs",
            ));
        }
    };
    let fields: Vec<&Field> = match &data.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(unnamed) => {
            return Err(syn::Error::new_spanned(
                unnamed,
                "Wire requires named fields",
            ));
        }
    };

    let struct_tags = parse_tags(&input.attrs)?;
    let field_tags = fields
        .iter()
        .map(|field| parse_tags(&field.attrs))
        .collect::<syn::Result<Vec<Tags>>>()?;

    let mut field_shapes = Vec::new();
    let mut ref_arms = Vec::new();
    let mut mut_arms = Vec::new();
    for (index, (field, tags)) in fields.iter().zip(&field_tags).enumerate() {
        let name = field.ident.as_ref().unwrap().to_string();
        if tags.ignore {
            field_shapes.push(quote! {
                ::wirebin::FieldShape {
                    name: #name,
                    shape: ::core::option::Option::None,
                    ignore: true,
                    packed: false,
                }
            });
            continue;
        }
        let ty = &field.ty;
        let packed = tags.packed;
        field_shapes.push(quote! {
            ::wirebin::FieldShape {
                name: #name,
                shape: ::core::option::Option::Some(<#ty as ::wirebin::Wire>::SHAPE),
                ignore: false,
                packed: #packed,
            }
        });
        let field_ident = field.ident.as_ref().unwrap();
        ref_arms.push(quote! { #index => &self.#field_ident, });
        mut_arms.push(quote! { #index => &mut self.#field_ident, });
    }

    let serializer = if struct_tags.serializer {
        quote! {
            ::core::option::Option::Some(&const { ::wirebin::serializer_ops!(Self) })
        }
    } else {
        quote! { ::core::option::Option::None }
    };

    // Generic structs get a `Wire` bound per type parameter and per used
    // field type, so the shape references resolve.
    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        for param in generics.type_params_mut() {
            param.bounds.push(parse_quote!(::wirebin::Wire));
        }
        let where_clause = generics.make_where_clause();
        for (field, tags) in fields.iter().zip(&field_tags) {
            if tags.ignore {
                continue;
            }
            let ty = &field.ty;
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::wirebin::Wire));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::wirebin::Wire for #ident #ty_generics #where_clause {
            const SHAPE: &'static ::wirebin::Shape = &const {
                ::wirebin::Shape {
                    type_identifier: #ident_str,
                    type_id: ::core::any::TypeId::of::<Self>,
                    kind: ::wirebin::Kind::Struct(&[#(#field_shapes,)*]),
                    serializer: #serializer,
                }
            };

            fn mirror(&self) -> ::wirebin::Value<'_> {
                ::wirebin::Value::Struct(self)
            }

            fn mirror_mut(&mut self) -> ::wirebin::ValueMut<'_> {
                ::wirebin::ValueMut::Struct(self)
            }
        }

        #[automatically_derived]
        impl #impl_generics ::wirebin::StructView for #ident #ty_generics #where_clause {
            fn field(&self, index: usize) -> &dyn ::wirebin::Reflected {
                match index {
                    #(#ref_arms)*
                    _ => panic!("no encodable field at index {index}"),
                }
            }

            fn field_mut(&mut self, index: usize) -> &mut dyn ::wirebin::Reflected {
                match index {
                    #(#mut_arms)*
                    _ => panic!("no encodable field at index {index}"),
                }
            }
        }
    })
}
