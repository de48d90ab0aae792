use std::collections::BTreeSet;

use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens, quote};
use syn::{Data, DeriveInput, Fields, Ident, Member, Type};

// -----------------------------------------------------------------------------
// Archive

pub(crate) fn impl_archive(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &ast.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "`Archive` cannot be derived for enums, implement it by hand",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "`Archive` cannot be derived for unions",
            ));
        }
    };

    let vc_archive = crate::path::vc_archive();
    let ident = &ast.ident;

    let members: Vec<Member> = fields.members().collect();
    let types: Vec<&Type> = fields.iter().map(|field| &field.ty).collect();

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut predicates = quote! { where };
    if let Some(where_clause) = where_clause {
        let existing = where_clause.predicates.iter();
        predicates.extend(quote! { #(#existing,)* });
    }
    let params: BTreeSet<Ident> = ast.generics.type_params().map(|p| p.ident.clone()).collect();
    for ty in types.iter().filter(|ty| mentions_any(ty, &params)) {
        predicates.extend(quote! { #ty: #vc_archive::Archive, });
    }

    let construct = match fields {
        Fields::Unit => quote! { Self },
        _ => quote! { Self { #( #members: #vc_archive::Archive::decode(dec)?, )* } },
    };

    Ok(quote! {
        impl #impl_generics #vc_archive::Archive for #ident #ty_generics #predicates {
            const KIND: #vc_archive::Kind = #vc_archive::Kind::Reflectible;

            #[allow(unused_variables)]
            fn encode(&self, enc: &mut #vc_archive::Encoder) {
                #( #vc_archive::Archive::encode(&self.#members, enc); )*
            }

            #[allow(unused_variables)]
            fn decode(dec: &mut #vc_archive::Decoder<'_>) -> #vc_archive::Result<Self> {
                ::core::result::Result::Ok(#construct)
            }

            #[allow(unused_variables)]
            fn decode_in_place(
                &mut self,
                dec: &mut #vc_archive::Decoder<'_>,
            ) -> #vc_archive::Result<()> {
                #( #vc_archive::Archive::decode_in_place(&mut self.#members, dec)?; )*
                ::core::result::Result::Ok(())
            }
        }
    })
}

/// Whether `ty` names one of the type parameters anywhere in its tokens.
fn mentions_any(ty: &Type, params: &BTreeSet<Ident>) -> bool {
    fn scan(tokens: TokenStream, params: &BTreeSet<Ident>) -> bool {
        tokens.into_iter().any(|tree| match tree {
            TokenTree::Ident(ident) => params.contains(&ident),
            TokenTree::Group(group) => scan(group.stream(), params),
            _ => false,
        })
    }

    !params.is_empty() && scan(ty.to_token_stream(), params)
}

// -----------------------------------------------------------------------------
// Tests
