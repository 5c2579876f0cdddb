use syn::{Field, Ident, LitStr, Type};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) primary_key: bool,
}

pub(crate) fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Model fields are expected to have a name");
    let mut metadata = ColumnMetadata {
        name: ident.to_string(),
        ident,
        ty: field.ty.clone(),
        primary_key: false,
    };
    for attr in &field.attrs {
        let path = attr.meta.path();
        if path.is_ident("column_name") {
            let Ok(v) = attr
                .meta
                .require_list()
                .and_then(|v| v.parse_args::<LitStr>())
            else {
                panic!(
                    "Error while parsing `column_name`, use it like #[column_name(\"{}\")]",
                    metadata.name
                );
            };
            metadata.name = v.value();
        } else if path.is_ident("primary_key") {
            if attr.meta.require_path_only().is_err() {
                panic!("Error while parsing `primary_key`, use it like #[primary_key]");
            }
            metadata.primary_key = true;
        }
    }
    metadata
}
