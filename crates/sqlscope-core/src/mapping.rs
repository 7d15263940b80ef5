//! Table mappings: the field registry behind every model.
//!
//! A [`TableMapping`] is built once per model type (typically inside a
//! `LazyLock`) and validated up front: identifier hygiene, column uniqueness,
//! and the exactly-one-primary-key rule all fail fast here rather than at
//! query time.

use crate::error::{Error, Result, SchemaError, SchemaErrorKind};
use crate::field::FieldDef;
use crate::identifiers::{is_valid_identifier, quote_ident};
use crate::record::{Columns, Record};
use std::collections::HashMap;
use std::sync::Arc;

/// A validated table mapping: table name plus fields in declaration order.
#[derive(Debug, Clone)]
pub struct TableMapping {
    table: String,
    fields: Vec<FieldDef>,
    /// Attribute name -> index
    index: HashMap<String, usize>,
    /// Index of the primary-key field
    pk: usize,
    /// Column names in field order, shared with records built from this mapping
    columns: Arc<Columns>,
}

impl TableMapping {
    /// Start building a mapping for a model type.
    ///
    /// The table name defaults to the lower-cased model name; override it
    /// with [`MappingBuilder::table`].
    pub fn builder(model_name: &str) -> MappingBuilder {
        MappingBuilder {
            table: model_name.to_lowercase(),
            fields: Vec::new(),
        }
    }

    /// The table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by attribute name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// The primary-key field.
    pub fn primary_key(&self) -> &FieldDef {
        &self.fields[self.pk]
    }

    /// Column metadata in field order, shared with records.
    pub fn columns(&self) -> &Arc<Columns> {
        &self.columns
    }

    /// Build a record over this mapping's columns.
    pub fn new_record(&self, values: Vec<crate::Value>) -> Record {
        Record::with_columns(Arc::clone(&self.columns), values)
    }

    /// Render a `create table` statement from this mapping.
    ///
    /// Column ddl comes from each field (`not null` added for non-nullable
    /// columns) and the primary key is emitted as a table constraint.
    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                let mut def = format!("  {} {}", quote_ident(&field.column), field.ddl);
                if !field.nullable {
                    def.push_str(" not null");
                }
                def
            })
            .collect();
        parts.push(format!(
            "  primary key({})",
            quote_ident(&self.primary_key().column)
        ));

        format!(
            "create table {} (\n{}\n)",
            quote_ident(&self.table),
            parts.join(",\n")
        )
    }
}

/// Builder for [`TableMapping`]; all validation happens in [`build`].
///
/// [`build`]: MappingBuilder::build
#[derive(Debug)]
pub struct MappingBuilder {
    table: String,
    fields: Vec<FieldDef>,
}

impl MappingBuilder {
    /// Override the table name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = name.into();
        self
    }

    /// Append a field; declaration order is preserved everywhere downstream.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate and build the mapping.
    ///
    /// Fails with a [`SchemaError`] when the table or a column is not a
    /// valid identifier, when two fields map to the same column, or when the
    /// primary-key count is not exactly one. The surviving primary key is
    /// normalized to non-updateable and non-nullable.
    #[allow(clippy::result_large_err)]
    pub fn build(self) -> Result<TableMapping> {
        let MappingBuilder { table, mut fields } = self;

        if !is_valid_identifier(&table) {
            return Err(Error::Schema(SchemaError {
                kind: SchemaErrorKind::InvalidIdentifier,
                message: format!("invalid table name: '{}'", table),
            }));
        }

        let mut index = HashMap::with_capacity(fields.len());
        let mut seen_columns = HashMap::with_capacity(fields.len());
        let mut pk: Option<usize> = None;

        for (i, field) in fields.iter().enumerate() {
            if !is_valid_identifier(&field.column) {
                return Err(Error::Schema(SchemaError {
                    kind: SchemaErrorKind::InvalidIdentifier,
                    message: format!(
                        "invalid column name '{}' for field '{}'",
                        field.column, field.name
                    ),
                }));
            }
            if let Some(prev) = seen_columns.insert(field.column.clone(), i) {
                return Err(Error::Schema(SchemaError {
                    kind: SchemaErrorKind::DuplicateColumn,
                    message: format!(
                        "fields '{}' and '{}' both map to column '{}'",
                        fields[prev].name, field.name, field.column
                    ),
                }));
            }
            index.insert(field.name.clone(), i);

            if field.primary_key {
                if let Some(first) = pk {
                    return Err(Error::Schema(SchemaError {
                        kind: SchemaErrorKind::DuplicatePrimaryKey,
                        message: format!(
                            "table '{}' has more than one primary key: '{}' and '{}'",
                            table, fields[first].name, field.name
                        ),
                    }));
                }
                pk = Some(i);
            }
        }

        let Some(pk) = pk else {
            return Err(Error::Schema(SchemaError {
                kind: SchemaErrorKind::MissingPrimaryKey,
                message: format!("table '{}' defines no primary key", table),
            }));
        };

        // A primary key is never updated and never NULL, whatever was declared.
        fields[pk].updateable = false;
        fields[pk].nullable = false;

        let columns = Arc::new(Columns::new(
            fields.iter().map(|f| f.column.clone()).collect(),
        ));

        Ok(TableMapping {
            table,
            fields,
            index,
            pk,
            columns,
        })
    }
}
