mod decode_column;
mod from_row;
mod table_name;

use decode_column::decode_column;
use from_row::from_row;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};
use table_name::{schema_name, table_name};

/// Implements `prepkit::Model` for a struct with named fields, one column per field.
///
/// Struct attributes: `#[table_name("...")]` (default: the struct name in snake case),
/// `#[schema_name("...")]`. Field attributes: `#[column_name("...")]` (default: the
/// field name), `#[primary_key]`.
#[proc_macro_derive(Model, attributes(schema_name, table_name, column_name, primary_key))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let model_name = name.to_string();
    let table_name = table_name(&item);
    let schema_name = schema_name(&item);
    let columns: Vec<_> = item.fields.iter().map(decode_column).collect();
    if columns.iter().filter(|c| c.primary_key).count() > 1 {
        panic!("Model `{}` declares more than one primary key", model_name);
    }
    let column_defs = columns.iter().map(|c| {
        let column = &c.name;
        let field = c.ident.to_string();
        let primary_key = c.primary_key;
        quote! {
            ::prepkit::ColumnDef {
                name: #column,
                field: #field,
                primary_key: #primary_key,
            }
        }
    });
    let from_row = from_row(&item, &columns);
    quote! {
        impl ::prepkit::Model for #name {
            fn model() -> &'static ::prepkit::ModelDescriptor {
                static MODEL: ::prepkit::ModelDescriptor = ::prepkit::ModelDescriptor {
                    name: #model_name,
                    schema: #schema_name,
                    table: #table_name,
                    columns: &[#(#column_defs),*],
                };
                &MODEL
            }

            #from_row
        }
    }
    .into()
}
