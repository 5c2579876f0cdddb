use crate::{Result, RowLabeled};

/// Column of a model as known to the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Name in the database.
    pub name: &'static str,
    /// Name of the Rust field.
    pub field: &'static str,
    pub primary_key: bool,
}

/// Row shape targeted by a query: where the rows come from and which columns they
/// carry.
#[derive(Debug, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Name of the Rust type, used in error messages.
    pub name: &'static str,
    pub schema: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
}

impl ModelDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
    pub fn primary_key(&self) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

/// A type whose values are rows of a table. Usually derived with `#[derive(Model)]`.
pub trait Model: Send + Sized + 'static {
    fn model() -> &'static ModelDescriptor;
    fn from_row(row: RowLabeled) -> Result<Self>;
}
