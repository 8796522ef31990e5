//! Live schema introspection.
//!
//! Builds the `SchemaCatalog` from the sandbox's own `information_schema`,
//! so the catalog always matches what generated SQL will actually hit.

use sqlagent_core::{ColumnDef, Relation, SchemaCatalog, SchemaFragment};
use sqlx::Row;

use crate::error::SandboxError;
use crate::executor::SqlSandbox;

impl SqlSandbox {
    /// Introspect every table in the sandbox schema into a catalog.
    ///
    /// # Errors
    /// Returns an error if any introspection query fails.
    pub async fn introspect_catalog(&self) -> Result<SchemaCatalog, SandboxError> {
        let tables = sqlx::query(
            "SELECT TABLE_NAME, TABLE_COMMENT \
             FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_NAME",
        )
        .fetch_all(self.pool())
        .await
        .map_err(SandboxError::Introspection)?;

        let mut fragments = Vec::with_capacity(tables.len());
        for table_row in &tables {
            let table_name: String =
                table_row.try_get("TABLE_NAME").map_err(SandboxError::Introspection)?;
            let comment: String =
                table_row.try_get("TABLE_COMMENT").unwrap_or_default();

            let columns = self.introspect_columns(&table_name).await?;
            let relations = self.introspect_relations(&table_name).await?;
            fragments.push(SchemaFragment { table_name, comment, columns, relations });
        }

        tracing::info!(tables = fragments.len(), "sandbox schema introspected");
        Ok(SchemaCatalog::new(fragments))
    }

    async fn introspect_columns(&self, table: &str) -> Result<Vec<ColumnDef>, SandboxError> {
        let rows = sqlx::query(
            "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(table)
        .fetch_all(self.pool())
        .await
        .map_err(SandboxError::Introspection)?;

        rows.iter()
            .map(|row| {
                let nullable: String = row.try_get("IS_NULLABLE")?;
                Ok(ColumnDef {
                    name: row.try_get("COLUMN_NAME")?,
                    sql_type: row.try_get("COLUMN_TYPE")?,
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(SandboxError::Introspection)
    }

    async fn introspect_relations(&self, table: &str) -> Result<Vec<Relation>, SandboxError> {
        let rows = sqlx::query(
            "SELECT COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
             FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
               AND REFERENCED_TABLE_NAME IS NOT NULL \
             ORDER BY COLUMN_NAME",
        )
        .bind(table)
        .fetch_all(self.pool())
        .await
        .map_err(SandboxError::Introspection)?;

        rows.iter()
            .map(|row| {
                Ok(Relation {
                    column: row.try_get("COLUMN_NAME")?,
                    referenced_table: row.try_get("REFERENCED_TABLE_NAME")?,
                    referenced_column: row.try_get("REFERENCED_COLUMN_NAME")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(SandboxError::Introspection)
    }
}
