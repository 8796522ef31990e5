use serde::{Deserialize, Serialize};

/// One column of a sandbox table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
}

/// A foreign-key style relation from a column to another table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Minimal description of one table: everything the generator needs to
/// produce correct SQL against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFragment {
    pub table_name: String,
    #[serde(default)]
    pub comment: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl SchemaFragment {
    /// Render this fragment in the form the generation prompt expects.
    #[must_use]
    pub fn format_for_prompt(&self) -> String {
        let mut out = format!("## Table: {}\n", self.table_name);
        if !self.comment.is_empty() {
            out.push_str(&format!("Description: {}\n", self.comment));
        }
        out.push_str("Columns:\n");
        for col in &self.columns {
            let nullable = if col.nullable { " (nullable)" } else { "" };
            out.push_str(&format!("  - {}: {}{}\n", col.name, col.sql_type, nullable));
        }
        for rel in &self.relations {
            out.push_str(&format!(
                "Foreign key: {} -> {}.{}\n",
                rel.column, rel.referenced_table, rel.referenced_column
            ));
        }
        out
    }
}

/// Static description of every table available in the sandbox.
///
/// Read-mostly: built once at startup (from a JSON file or live
/// introspection) and shared read-only across concurrent requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    fragments: Vec<SchemaFragment>,
}

impl SchemaCatalog {
    #[must_use]
    pub fn new(fragments: Vec<SchemaFragment>) -> Self {
        Self { fragments }
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// # Errors
    /// Returns a serde error if the document is not a valid catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        // Accept either the wrapped form or a bare fragment array.
        serde_json::from_str::<Self>(json)
            .or_else(|_| serde_json::from_str::<Vec<SchemaFragment>>(json).map(Self::new))
    }

    #[must_use]
    pub fn fragments(&self) -> &[SchemaFragment] {
        &self.fragments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Look up a table by exact (case-insensitive) name.
    #[must_use]
    pub fn get(&self, table_name: &str) -> Option<&SchemaFragment> {
        self.fragments.iter().find(|f| f.table_name.eq_ignore_ascii_case(table_name))
    }

    /// Table names in catalog order.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.table_name.as_str()).collect()
    }
}

/// Render a retrieved schema subset as the prompt block shared by the
/// generator and the intent classifier.
#[must_use]
pub fn format_schema_for_prompt(fragments: &[SchemaFragment]) -> String {
    fragments.iter().map(SchemaFragment::format_for_prompt).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> SchemaFragment {
        SchemaFragment {
            table_name: "products".to_owned(),
            comment: "Product master data".to_owned(),
            columns: vec![
                ColumnDef { name: "id".to_owned(), sql_type: "bigint".to_owned(), nullable: false },
                ColumnDef {
                    name: "name".to_owned(),
                    sql_type: "varchar(255)".to_owned(),
                    nullable: false,
                },
            ],
            relations: vec![],
        }
    }

    #[test]
    fn test_catalog_lookup_case_insensitive() {
        let catalog = SchemaCatalog::new(vec![products()]);
        assert!(catalog.get("Products").is_some());
        assert!(catalog.get("orders").is_none());
    }

    #[test]
    fn test_from_json_bare_array() {
        let json = r#"[{"table_name":"t","columns":[{"name":"id","sql_type":"int","nullable":false}]}]"#;
        let catalog = SchemaCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.fragments()[0].table_name, "t");
    }

    #[test]
    fn test_format_contains_columns_and_relations() {
        let mut frag = products();
        frag.relations.push(Relation {
            column: "category_id".to_owned(),
            referenced_table: "categories".to_owned(),
            referenced_column: "id".to_owned(),
        });
        let text = frag.format_for_prompt();
        assert!(text.contains("## Table: products"));
        assert!(text.contains("name: varchar(255)"));
        assert!(text.contains("categories.id"));
    }
}
