//! Explicit table catalog.

use crate::error::BuildError;
use crate::schema::{Column, Table};
use std::collections::BTreeMap;

/// Name-indexed set of declared tables, passed by reference wherever
/// lookup by name is needed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, table: Table) -> Result<(), BuildError> {
        if self.tables.contains_key(table.name()) {
            return Err(BuildError::DuplicateTable {
                table: table.name().to_string(),
            });
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Resolve `table.column`
    pub fn column(&self, table: &str, column: &str) -> Result<Column, BuildError> {
        self.tables
            .get(table)
            .ok_or_else(|| BuildError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })?
            .column(column)
    }

    /// Tables in name order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;

    #[test]
    fn test_register_and_lookup() -> anyhow::Result<()> {
        let mut catalog = Catalog::new();
        catalog.register(
            Table::builder("cities")
                .column(ColumnDef::integer("id").auto_increment())
                .column(ColumnDef::varchar("name", 50))
                .build()?,
        )?;

        assert!(catalog.table("cities").is_some());
        assert_eq!(catalog.column("cities", "name")?.qualified_name(), "cities.name");
        assert!(catalog.column("users", "name").is_err());

        let dup = Table::builder("cities")
            .column(ColumnDef::integer("id"))
            .build()?;
        assert!(matches!(
            catalog.register(dup),
            Err(BuildError::DuplicateTable { .. })
        ));
        assert_eq!(catalog.tables().count(), 1);
        Ok(())
    }
}
