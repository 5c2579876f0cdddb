use convert_case::{Case, Casing};
use syn::{ItemStruct, LitStr};

fn string_attribute(item: &ItemStruct, name: &str, example: &str) -> Option<String> {
    item.attrs.iter().find_map(|attr| {
        if attr.meta.path().is_ident(name) {
            let Ok(v) = attr
                .meta
                .require_list()
                .and_then(|v| v.parse_args::<LitStr>())
            else {
                panic!(
                    "Error while parsing `{}`, use it like #[{}(\"{}\")]",
                    name, name, example
                );
            };
            return Some(v.value());
        }
        None
    })
}

pub(crate) fn table_name(item: &ItemStruct) -> String {
    let default_table_name = item.ident.to_string().to_case(Case::Snake);
    string_attribute(item, "table_name", &format!("{}_table", default_table_name))
        .unwrap_or(default_table_name)
}

/// Empty when the table is not qualified by a schema.
pub(crate) fn schema_name(item: &ItemStruct) -> String {
    string_attribute(item, "schema_name", "public").unwrap_or_default()
}
