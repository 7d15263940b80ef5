//! Field descriptors for table mappings.

use crate::value::Value;

/// Function producing a fresh default value on every evaluation.
pub type ValueGenerator = fn() -> Value;

/// The declared column type of a field.
///
/// Each kind carries the DDL fragment used when generating schema; nothing
/// here is enforced at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Character data, `varchar(255)`
    String,
    /// 64-bit integer, `bigint`
    Integer,
    /// Floating point, `real`
    Float,
    /// Boolean, `bool`
    Boolean,
    /// Large text / binary, `blob`
    Text,
    /// Optimistic version counter, `bigint` starting at 0
    Version,
}

impl FieldKind {
    /// The DDL fragment used for this kind unless overridden.
    #[must_use]
    pub const fn default_ddl(&self) -> &'static str {
        match self {
            FieldKind::String => "varchar(255)",
            FieldKind::Integer | FieldKind::Version => "bigint",
            FieldKind::Float => "real",
            FieldKind::Boolean => "bool",
            FieldKind::Text => "blob",
        }
    }
}

/// A field's default, distinguishing constants from generators.
///
/// A constant evaluates to the same value every time; a generator is invoked
/// freshly on each evaluation (and therefore once per insert).
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// No default
    None,
    /// Constant default value
    Value(Value),
    /// Generated default (ids, timestamps)
    Generator(ValueGenerator),
}

impl FieldDefault {
    /// Check whether a default is present.
    pub const fn is_some(&self) -> bool {
        !matches!(self, FieldDefault::None)
    }

    /// Evaluate the default: clone a constant, invoke a generator.
    pub fn evaluate(&self) -> Option<Value> {
        match self {
            FieldDefault::None => None,
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Generator(f) => Some(f()),
        }
    }
}

/// Metadata about a mapped field/column.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Attribute name on the model struct
    pub name: String,
    /// Database column name (defaults to the attribute name)
    pub column: String,
    /// Declared column type
    pub kind: FieldKind,
    /// Default value, if any
    pub default: FieldDefault,
    /// Whether this is the primary key
    pub primary_key: bool,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Whether UPDATE statements may set this column
    pub updateable: bool,
    /// Whether this column participates in schema-level inserts
    pub insertable: bool,
    /// DDL fragment for schema generation
    pub ddl: String,
}

impl FieldDef {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            kind,
            default: FieldDefault::None,
            primary_key: false,
            nullable: false,
            updateable: true,
            insertable: true,
            ddl: kind.default_ddl().to_string(),
        }
    }

    /// A character field, `varchar(255)`.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// An integer field, `bigint`.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// A floating-point field, `real`.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    /// A boolean field, `bool`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// A large text field, `blob`.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// A version counter field, `bigint` with a constant default of 0.
    pub fn version(name: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::Version);
        field.default = FieldDefault::Value(Value::Int(0));
        field
    }

    /// Set the database column name.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = name.into();
        self
    }

    /// Set the primary-key flag.
    pub fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set the nullable flag.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set the updateable flag.
    pub fn updateable(mut self, value: bool) -> Self {
        self.updateable = value;
        self
    }

    /// Set the insertable flag.
    pub fn insertable(mut self, value: bool) -> Self {
        self.insertable = value;
        self
    }

    /// Set a constant default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Set a generated default.
    pub fn default_fn(mut self, generator: ValueGenerator) -> Self {
        self.default = FieldDefault::Generator(generator);
        self
    }

    /// Override the DDL fragment.
    pub fn ddl(mut self, ddl: impl Into<String>) -> Self {
        self.ddl = ddl.into();
        self
    }
}
