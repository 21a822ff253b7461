use std::fmt::Display;

/// A single decoded cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl Value {
    /// Wraps text, mapping the empty string to `Empty`.
    pub fn text<S: Into<String>>(text: S) -> Value {
        let text = text.into();
        if text.is_empty() {
            Value::Empty
        } else {
            Value::Text(text)
        }
    }

    /// Returns true if this value is missing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Returns the number held by this value, if any.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{}", number),
            Value::Text(text) => write!(f, "{}", text),
            Value::Empty => Ok(()),
        }
    }
}

/// The single type a column's cells share.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-empty cell is a number (also true of a column with no values)
    Numeric,
    /// At least one non-empty cell is text
    Text,
}

impl ColumnKind {
    /// Detects the column kind from its values.
    pub fn detect(values: &[Value]) -> ColumnKind {
        if values.iter().all(|value| !matches!(value, Value::Text(_))) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
}

/// A named column whose kind is inferred once, when it is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Vec<Value>,
}

impl Column {
    pub fn new<S: Into<String>>(name: S, values: Vec<Value>) -> Column {
        let kind = ColumnKind::detect(&values);
        Column { name: name.into(), kind, values }
    }

    /// Builds a numeric column; `None` marks a missing cell.
    pub fn numbers<S: Into<String>>(name: S, numbers: &[Option<f64>]) -> Column {
        let values = numbers
            .iter()
            .map(|number| number.map(Value::Number).unwrap_or(Value::Empty))
            .collect();
        Column::new(name, values)
    }

    /// Builds a column from text cells; empty strings are missing cells.
    pub fn texts<S: Into<String>>(name: S, texts: &[&str]) -> Column {
        Column::new(name, texts.iter().map(|text| Value::text(*text)).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
