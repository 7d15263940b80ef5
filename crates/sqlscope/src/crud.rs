//! CRUD operations over mapped models.
//!
//! [`ModelOps`] is a blanket extension over [`Model`]: implement the three
//! `Model` methods by hand and every operation here comes for free. All SQL
//! is generated from the model's [`TableMapping`] with quoted identifiers and
//! `?` placeholders, and every operation takes the [`DbContext`] explicitly.

use crate::context::DbContext;
use sqlscope_core::{Model, Record, Result, TableMapping, Value, quote_ident};

fn select_columns(mapping: &TableMapping) -> String {
    mapping
        .fields()
        .iter()
        .map(|f| quote_ident(&f.column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_sql(mapping: &TableMapping, tail: &str) -> String {
    let mut sql = format!(
        "select {} from {}",
        select_columns(mapping),
        quote_ident(mapping.table())
    );
    if !tail.is_empty() {
        sql.push(' ');
        sql.push_str(tail);
    }
    sql
}

fn count_sql(mapping: &TableMapping, tail: &str) -> String {
    let mut sql = format!(
        "select count({}) from {}",
        quote_ident(&mapping.primary_key().column),
        quote_ident(mapping.table())
    );
    if !tail.is_empty() {
        sql.push(' ');
        sql.push_str(tail);
    }
    sql
}

fn insert_sql(mapping: &TableMapping) -> String {
    let columns = select_columns(mapping);
    let markers = vec!["?"; mapping.fields().len()].join(", ");
    format!(
        "insert into {} ({}) values ({})",
        quote_ident(mapping.table()),
        columns,
        markers
    )
}

/// The instance's values in field order, with `Null` replaced by the field
/// default where one is declared. Generators run once per call.
fn complete_values(record: &Record, mapping: &TableMapping) -> Vec<Value> {
    mapping
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            match record.value_at(i).cloned().unwrap_or(Value::Null) {
                Value::Null => field.default.evaluate().unwrap_or(Value::Null),
                value => value,
            }
        })
        .collect()
}

fn pk_value(record: &Record, mapping: &TableMapping) -> Value {
    record
        .value(&mapping.primary_key().column)
        .cloned()
        .unwrap_or(Value::Null)
}

/// CRUD over any [`Model`].
///
/// Write operations go through [`DbContext::update`], so they auto-commit at
/// transaction depth 0 and join the open transaction otherwise.
pub trait ModelOps: Model {
    /// INSERT this instance, writing every mapped column in field order.
    ///
    /// A `Null` value for a field with a declared default is replaced by the
    /// evaluated default. On success the instance is rebuilt from the
    /// completed values, so generated defaults become readable on it.
    #[allow(clippy::result_large_err)]
    fn insert(&mut self, ctx: &DbContext) -> Result<u64> {
        let mapping = Self::mapping();
        let values = complete_values(&self.to_record(), mapping);
        let affected = ctx.update(&insert_sql(mapping), &values)?;
        *self = Self::from_record(&mapping.new_record(values))?;
        Ok(affected)
    }

    /// UPDATE the row keyed by this instance's primary key.
    ///
    /// Only fields flagged updateable are written; the primary key never is.
    /// With no updateable fields there is nothing to do and `Ok(0)` is
    /// returned without touching the database.
    #[allow(clippy::result_large_err)]
    fn update(&self, ctx: &DbContext) -> Result<u64> {
        let mapping = Self::mapping();
        let record = self.to_record();

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (i, field) in mapping.fields().iter().enumerate() {
            if !field.updateable {
                continue;
            }
            let value = match record.value_at(i).cloned().unwrap_or(Value::Null) {
                Value::Null => field.default.evaluate().unwrap_or(Value::Null),
                value => value,
            };
            assignments.push(format!("{} = ?", quote_ident(&field.column)));
            params.push(value);
        }
        if assignments.is_empty() {
            return Ok(0);
        }
        params.push(pk_value(&record, mapping));

        let sql = format!(
            "update {} set {} where {} = ?",
            quote_ident(mapping.table()),
            assignments.join(", "),
            quote_ident(&mapping.primary_key().column)
        );
        ctx.update(&sql, &params)
    }

    /// DELETE the row keyed by this instance's primary key.
    #[allow(clippy::result_large_err)]
    fn delete(&self, ctx: &DbContext) -> Result<u64> {
        let mapping = Self::mapping();
        let sql = format!(
            "delete from {} where {} = ?",
            quote_ident(mapping.table()),
            quote_ident(&mapping.primary_key().column)
        );
        ctx.update(&sql, &[pk_value(&self.to_record(), mapping)])
    }

    /// SELECT one row by primary key.
    #[allow(clippy::result_large_err)]
    fn get(ctx: &DbContext, pk: impl Into<Value>) -> Result<Option<Self>> {
        let mapping = Self::mapping();
        let tail = format!("where {} = ?", quote_ident(&mapping.primary_key().column));
        Self::find_first(ctx, &tail, &[pk.into()])
    }

    /// SELECT with a caller-supplied `where ...` tail, first row only.
    #[allow(clippy::result_large_err)]
    fn find_first(ctx: &DbContext, where_clause: &str, params: &[Value]) -> Result<Option<Self>> {
        let sql = select_sql(Self::mapping(), where_clause);
        match ctx.select_first(&sql, params)? {
            Some(record) => Ok(Some(Self::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// SELECT with a caller-supplied `where ...` tail, all rows.
    #[allow(clippy::result_large_err)]
    fn find_by(ctx: &DbContext, where_clause: &str, params: &[Value]) -> Result<Vec<Self>> {
        let sql = select_sql(Self::mapping(), where_clause);
        ctx.select(&sql, params)?
            .iter()
            .map(Self::from_record)
            .collect()
    }

    /// SELECT every row of the table.
    #[allow(clippy::result_large_err)]
    fn find_all(ctx: &DbContext) -> Result<Vec<Self>> {
        Self::find_by(ctx, "", &[])
    }

    /// Count every row of the table.
    #[allow(clippy::result_large_err)]
    fn count_all(ctx: &DbContext) -> Result<i64> {
        Self::count_by(ctx, "", &[])
    }

    /// Count rows matching a caller-supplied `where ...` tail.
    #[allow(clippy::result_large_err)]
    fn count_by(ctx: &DbContext, where_clause: &str, params: &[Value]) -> Result<i64> {
        let sql = count_sql(Self::mapping(), where_clause);
        match ctx.select_first(&sql, params)? {
            Some(record) => record.get_at::<i64>(0),
            None => Ok(0),
        }
    }
}

impl<M: Model> ModelOps for M {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use sqlscope_core::{Driver, DriverConnection, EngineConfig, FieldDef, ParamStyle};
    use std::sync::{Arc, LazyLock, Mutex};

    static TODO_MAPPING: LazyLock<TableMapping> = LazyLock::new(|| {
        TableMapping::builder("Todo")
            .field(FieldDef::integer("id").primary_key(true))
            .field(FieldDef::string("title"))
            .field(FieldDef::string("state").default_value("open"))
            .field(FieldDef::boolean("done"))
            .build()
            .unwrap()
    });

    #[derive(Debug, Clone, PartialEq)]
    struct Todo {
        id: Option<i64>,
        title: String,
        state: Option<String>,
        done: bool,
    }

    impl Model for Todo {
        fn mapping() -> &'static TableMapping {
            &TODO_MAPPING
        }

        fn to_record(&self) -> Record {
            Self::mapping().new_record(vec![
                self.id.into(),
                self.title.as_str().into(),
                self.state.clone().into(),
                self.done.into(),
            ])
        }

        fn from_record(record: &Record) -> Result<Self> {
            Ok(Self {
                id: record.get("id")?,
                title: record.get("title")?,
                state: record.get("state")?,
                done: record.get("done")?,
            })
        }
    }

    #[derive(Debug, Default)]
    struct FakeState {
        statements: Vec<(String, Vec<Value>)>,
        rows: Vec<Record>,
    }

    #[derive(Debug, Default)]
    struct FakeDriver {
        state: Arc<Mutex<FakeState>>,
    }

    impl Driver for FakeDriver {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn connect(&self, _config: &EngineConfig) -> Result<Box<dyn DriverConnection>> {
            Ok(Box::new(FakeConnection {
                state: Arc::clone(&self.state),
            }))
        }
    }

    #[derive(Debug)]
    struct FakeConnection {
        state: Arc<Mutex<FakeState>>,
    }

    impl DriverConnection for FakeConnection {
        fn param_style(&self) -> ParamStyle {
            ParamStyle::Question
        }

        fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
            let mut state = self.state.lock().unwrap();
            state.statements.push((sql.to_string(), params.to_vec()));
            Ok(state.rows.clone())
        }

        fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
            let mut state = self.state.lock().unwrap();
            state.statements.push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        fn commit(&mut self) -> Result<()> {
            Ok(())
        }

        fn rollback(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn fake_context() -> (DbContext, Arc<Mutex<FakeState>>) {
        let driver = FakeDriver::default();
        let state = Arc::clone(&driver.state);
        let engine = Arc::new(Engine::new(EngineConfig::new("u", "p", "db"), driver));
        (DbContext::new(engine), state)
    }

    #[test]
    fn insert_writes_every_mapped_column() {
        let (ctx, state) = fake_context();
        let mut todo = Todo {
            id: Some(7),
            title: "write tests".to_string(),
            state: Some("started".to_string()),
            done: false,
        };
        let affected = todo.insert(&ctx).unwrap();
        assert_eq!(affected, 1);

        let state = state.lock().unwrap();
        let (sql, params) = &state.statements[0];
        assert_eq!(
            sql,
            "insert into \"todo\" (\"id\", \"title\", \"state\", \"done\") values (?, ?, ?, ?)"
        );
        assert_eq!(params, &vec![
            Value::Int(7),
            Value::Text("write tests".to_string()),
            Value::Text("started".to_string()),
            Value::Bool(false),
        ]);
    }

    #[test]
    fn insert_fills_null_with_field_default() {
        let (ctx, state) = fake_context();
        let mut todo = Todo {
            id: Some(1),
            title: "t".to_string(),
            state: None,
            done: true,
        };
        todo.insert(&ctx).unwrap();

        let recorded = state.lock().unwrap();
        let (_, params) = &recorded.statements[0];
        assert_eq!(params[2], Value::Text("open".to_string()));
        // The instance was rebuilt from the completed values.
        assert_eq!(todo.state.as_deref(), Some("open"));
    }

    #[test]
    fn update_sets_only_updateable_fields() {
        let (ctx, state) = fake_context();
        let todo = Todo {
            id: Some(7),
            title: "new title".to_string(),
            state: Some("open".to_string()),
            done: true,
        };
        todo.update(&ctx).unwrap();

        let state = state.lock().unwrap();
        let (sql, params) = &state.statements[0];
        assert_eq!(
            sql,
            "update \"todo\" set \"title\" = ?, \"state\" = ?, \"done\" = ? where \"id\" = ?"
        );
        // The key rides last, after the assignments.
        assert_eq!(params.last(), Some(&Value::Int(7)));
    }

    #[test]
    fn delete_keys_on_primary_key() {
        let (ctx, state) = fake_context();
        let todo = Todo {
            id: Some(7),
            title: String::new(),
            state: None,
            done: false,
        };
        todo.delete(&ctx).unwrap();

        let state = state.lock().unwrap();
        let (sql, params) = &state.statements[0];
        assert_eq!(sql, "delete from \"todo\" where \"id\" = ?");
        assert_eq!(params, &vec![Value::Int(7)]);
    }

    #[test]
    fn get_materializes_one_row() {
        let (ctx, state) = fake_context();
        let stored = Todo {
            id: Some(7),
            title: "stored".to_string(),
            state: Some("open".to_string()),
            done: false,
        };
        state.lock().unwrap().rows = vec![stored.to_record()];

        let found = Todo::get(&ctx, 7i64).unwrap();
        assert_eq!(found, Some(stored));

        let state = state.lock().unwrap();
        let (sql, _) = &state.statements[0];
        assert_eq!(
            sql,
            "select \"id\", \"title\", \"state\", \"done\" from \"todo\" where \"id\" = ?"
        );
    }

    #[test]
    fn count_sql_without_tail_has_no_trailing_space() {
        assert_eq!(
            count_sql(Todo::mapping(), ""),
            "select count(\"id\") from \"todo\""
        );
        assert_eq!(
            count_sql(Todo::mapping(), "where done = ?"),
            "select count(\"id\") from \"todo\" where done = ?"
        );
    }

    #[test]
    fn find_all_selects_without_tail() {
        let (ctx, state) = fake_context();
        let rows = Todo::find_all(&ctx).unwrap();
        assert!(rows.is_empty());

        let state = state.lock().unwrap();
        let (sql, _) = &state.statements[0];
        assert_eq!(sql, "select \"id\", \"title\", \"state\", \"done\" from \"todo\"");
    }
}
