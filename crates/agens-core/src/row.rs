//! Result rows of text cells and typed decoding.
//!
//! Commands go through the simple-query protocol, so every cell arrives as
//! text (or NULL). Callers pick the type they expect with [`Row::get`].

use std::sync::Arc;

use serde_json::Value;

use crate::entity::{Edge, Entity, GraphId, GraphPath, Vertex};
use crate::error::{AgensError, AgensResult};

/// Decoding of a single non-NULL text cell.
pub trait FromText: Sized {
    fn from_text(text: &str) -> AgensResult<Self>;
}

impl FromText for String {
    /// Raw cell text. A jsonb string (`"Tom"`) is unquoted.
    fn from_text(text: &str) -> AgensResult<Self> {
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            if let Ok(Value::String(s)) = serde_json::from_str::<Value>(text) {
                return Ok(s);
            }
        }
        Ok(text.to_string())
    }
}

macro_rules! from_text_via_parse {
    ($($ty:ty),*) => {
        $(
            impl FromText for $ty {
                fn from_text(text: &str) -> AgensResult<Self> {
                    text.trim().parse::<$ty>().map_err(|e| {
                        AgensError::decode(stringify!($ty), format!("'{}': {}", text, e))
                    })
                }
            }
        )*
    };
}

from_text_via_parse!(i32, i64, u32, u64, f64);

impl FromText for bool {
    fn from_text(text: &str) -> AgensResult<Self> {
        match text.trim() {
            "t" | "true" | "TRUE" => Ok(true),
            "f" | "false" | "FALSE" => Ok(false),
            other => Err(AgensError::decode("bool", format!("'{}' is not a boolean", other))),
        }
    }
}

impl FromText for Value {
    /// JSON text; anything that is not valid JSON becomes a JSON string.
    fn from_text(text: &str) -> AgensResult<Self> {
        Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }
}

impl FromText for GraphId {
    fn from_text(text: &str) -> AgensResult<Self> {
        text.parse()
    }
}

impl FromText for Vertex {
    fn from_text(text: &str) -> AgensResult<Self> {
        text.parse()
    }
}

impl FromText for Edge {
    fn from_text(text: &str) -> AgensResult<Self> {
        text.parse()
    }
}

impl FromText for GraphPath {
    fn from_text(text: &str) -> AgensResult<Self> {
        text.parse()
    }
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Build a row from literal cells; column names are `?column?`.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let values: Vec<Option<String>> = cells.into_iter().map(|c| c.map(Into::into)).collect();
        let columns: Arc<[String]> = values.iter().map(|_| "?column?".to_string()).collect();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn column_name(&self, idx: usize) -> String {
        self.columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("#{}", idx))
    }

    /// Raw text of a cell; `None` for NULL.
    pub fn try_get_raw(&self, idx: usize) -> AgensResult<Option<&str>> {
        self.values
            .get(idx)
            .map(|v| v.as_deref())
            .ok_or_else(|| AgensError::decode(format!("#{}", idx), "column index out of range"))
    }

    /// Decode a non-NULL cell.
    pub fn get<T: FromText>(&self, idx: usize) -> AgensResult<T> {
        match self.try_get_raw(idx)? {
            Some(text) => T::from_text(text).map_err(|e| self.wrap(idx, e)),
            None => Err(AgensError::UnexpectedNull(self.column_name(idx))),
        }
    }

    /// Decode a cell that may be NULL.
    pub fn get_opt<T: FromText>(&self, idx: usize) -> AgensResult<Option<T>> {
        match self.try_get_raw(idx)? {
            Some(text) => T::from_text(text).map(Some).map_err(|e| self.wrap(idx, e)),
            None => Ok(None),
        }
    }

    /// Decode a cell by column name.
    pub fn get_by_name<T: FromText>(&self, name: &str) -> AgensResult<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AgensError::decode(name, "no such column"))?;
        self.get(idx)
    }

    /// Every vertex or edge found in the row's cells. Paths contribute all their entities.
    pub fn entities(&self) -> Vec<Entity> {
        let mut out = Vec::new();
        for text in self.values.iter().flatten() {
            if let Some(entity) = Entity::parse_any(text) {
                out.push(entity);
            } else if text.starts_with('[') {
                if let Ok(path) = text.parse::<GraphPath>() {
                    out.extend(path.entities());
                }
            }
        }
        out
    }

    /// Raw cell values.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    fn wrap(&self, idx: usize, err: AgensError) -> AgensError {
        match err {
            AgensError::Decode { message, .. } => AgensError::decode(self.column_name(idx), message),
            other => AgensError::decode(self.column_name(idx), other.to_string()),
        }
    }
}

/// Rows returned by one command plus the affected row count, when reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub affected: Option<u64>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>, affected: Option<u64>) -> Self {
        Self { rows, affected }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(cells: &[Option<&str>]) -> Row {
        let columns: Arc<[String]> = (0..cells.len()).map(|i| format!("c{}", i)).collect();
        Row::new(columns, cells.iter().map(|c| c.map(str::to_string)).collect())
    }

    #[test]
    fn test_scalars() {
        let r = row(&[Some("42"), Some("t"), Some("3.5"), Some("\"Tom\""), Some("plain")]);
        assert_eq!(r.get::<i64>(0).unwrap(), 42);
        assert!(r.get::<bool>(1).unwrap());
        assert_eq!(r.get::<f64>(2).unwrap(), 3.5);
        assert_eq!(r.get::<String>(3).unwrap(), "Tom");
        assert_eq!(r.get::<String>(4).unwrap(), "plain");
    }

    #[test]
    fn test_null_handling() {
        let r = row(&[None]);
        assert!(matches!(r.get::<i64>(0), Err(AgensError::UnexpectedNull(c)) if c == "c0"));
        assert_eq!(r.get_opt::<i64>(0).unwrap(), None);
    }

    #[test]
    fn test_decode_error_names_column() {
        let r = row(&[Some("abc")]);
        match r.get::<i64>(0) {
            Err(AgensError::Decode { column, .. }) => assert_eq!(column, "c0"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(r.get::<i64>(3).is_err());
    }

    #[test]
    fn test_json_values() {
        let r = row(&[Some("{\"a\": [1, 2]}"), Some("not json")]);
        assert_eq!(r.get::<Value>(0).unwrap(), json!({"a": [1, 2]}));
        assert_eq!(r.get::<Value>(1).unwrap(), json!("not json"));
    }

    #[test]
    fn test_get_by_name_and_entities() {
        let r = row(&[
            Some(r#"person[3.1]{"name": "Tom"}"#),
            Some(r#"knows[4.1][3.1,3.2]{}"#),
            Some("7"),
            Some(r#"[person[3.2]{},knows[4.2][3.2,3.3]{},person[3.3]{}]"#),
        ]);
        assert_eq!(r.get_by_name::<i64>("c2").unwrap(), 7);
        assert!(r.get_by_name::<i64>("missing").is_err());
        let v: Vertex = r.get(0).unwrap();
        assert_eq!(v.label(), Some("person"));
        assert_eq!(r.entities().len(), 5);
    }

    #[test]
    fn test_from_cells() {
        let r = Row::from_cells(vec![Some("1"), None]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.columns()[0], "?column?");
        assert_eq!(r.get::<u32>(0).unwrap(), 1);
    }
}
