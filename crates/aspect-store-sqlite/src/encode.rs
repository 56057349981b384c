//! Translation between document-store concepts and SQLite.
//!
//! A collection is a table with one JSON `body` column. Document fields are
//! addressed with `json_extract(body, '$.<field>')`, so collection and field
//! names are interpolated into SQL and must pass [`check_name`] first.

use aspect_core::{index::IndexSpec, store::Document};
use rusqlite::types::Value;
use serde_json::Value as Json;

use crate::{Error, Result};

/// Accept `[A-Za-z_][A-Za-z0-9_]*` only.
pub fn check_name(name: &str) -> Result<&str> {
  let mut chars = name.chars();
  let valid = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
  if valid { Ok(name) } else { Err(Error::InvalidName(name.to_owned())) }
}

fn field_expr(field: &str) -> Result<String> {
  Ok(format!("json_extract(body, '$.{}')", check_name(field)?))
}

pub fn create_collection_sql(collection: &str) -> Result<String> {
  Ok(format!(
    "CREATE TABLE IF NOT EXISTS \"{}\" (
       doc_id  INTEGER PRIMARY KEY,
       body    TEXT NOT NULL CHECK (json_valid(body))
     )",
    check_name(collection)?
  ))
}

pub fn create_index_sql(collection: &str, index: &IndexSpec) -> Result<String> {
  let exprs = index
    .fields
    .iter()
    .map(|f| field_expr(f))
    .collect::<Result<Vec<_>>>()?
    .join(", ");
  Ok(format!(
    "CREATE {}INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({exprs})",
    if index.unique { "UNIQUE " } else { "" },
    check_name(index.name)?,
    check_name(collection)?,
  ))
}

/// `SELECT body` for documents matching every field of `filter`, with the
/// positional parameters to bind.
pub fn find_sql(collection: &str, filter: &Document) -> Result<(String, Vec<Value>)> {
  let mut clauses = Vec::with_capacity(filter.len());
  let mut params = Vec::with_capacity(filter.len());

  for (field, value) in filter {
    let expr = field_expr(field)?;
    match encode_json_scalar(value) {
      Some(Value::Null) => clauses.push(format!("{expr} IS NULL")),
      Some(v) => {
        params.push(v);
        clauses.push(format!("{expr} = ?{}", params.len()));
      }
      None => return Err(Error::UnsupportedFilter(field.clone())),
    }
  }

  let mut sql = format!("SELECT body FROM \"{}\"", check_name(collection)?);
  if !clauses.is_empty() {
    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
  }
  sql.push_str(" ORDER BY doc_id");
  Ok((sql, params))
}

/// The SQLite value `json_extract` yields for a scalar; `None` for arrays and
/// objects.
fn encode_json_scalar(value: &Json) -> Option<Value> {
  match value {
    Json::Null => Some(Value::Null),
    Json::Bool(b) => Some(Value::Integer(i64::from(*b))),
    Json::Number(n) => match n.as_i64() {
      Some(i) => Some(Value::Integer(i)),
      None => n.as_f64().map(Value::Real),
    },
    Json::String(s) => Some(Value::Text(s.clone())),
    Json::Array(_) | Json::Object(_) => None,
  }
}

pub fn decode_document(body: &str) -> Result<Document> { Ok(serde_json::from_str(body)?) }
