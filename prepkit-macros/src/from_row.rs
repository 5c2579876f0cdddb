use crate::decode_column::ColumnMetadata;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

pub(crate) fn from_row(item: &ItemStruct, columns: &[ColumnMetadata]) -> TokenStream {
    let struct_name = &item.ident;
    let holders = columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote! {
            let mut #ident: Option<#ty> = None;
        }
    });
    let assignments = columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let name = &c.name;
        quote! {
            if __n__ == #name {
                #ident = Some(<#ty as ::prepkit::AsValue>::try_from_value(__v__)?);
                continue;
            }
        }
    });
    let fields = columns.iter().map(|c| {
        let ident = &c.ident;
        let name = &c.name;
        quote! {
            #ident: #ident.ok_or_else(|| __make_error__(#name))?
        }
    });
    quote! {
        fn from_row(row: ::prepkit::RowLabeled) -> ::prepkit::Result<Self> {
            #(#holders)*
            for (__n__, __v__) in ::std::iter::zip(row.labels.iter(), row.values.into_iter()) {
                #(#assignments)*
            }
            let __make_error__ = |name: &str| ::prepkit::Error::msg(format!(
                "Column `{}` does not exist in the row provided",
                name
            ));
            Ok(#struct_name {
                #(#fields,)*
            })
        }
    }
}
