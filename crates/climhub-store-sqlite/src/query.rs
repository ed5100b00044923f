//! Parameterised query assembly.
//!
//! [`WhereClause`] turns an ordered set of `column -> value` filters into a
//! predicate and a matching positional parameter list. Values are always
//! bound, never spliced into the SQL text. Column names are `&'static str`
//! so they can only come from code, not from a request.
//!
//! One placeholder convention is used throughout the crate: anonymous `?`,
//! bound in order via [`rusqlite::params_from_iter`].
//!
//! Substring predicates compare through [`CASEFOLD_FN`] on both sides, so
//! matching ignores case for all of Unicode rather than only ASCII as plain
//! SQLite `LIKE` does. Every connection that runs these predicates must have
//! the function registered with [`register_casefold`].

use climhub_core::item::PageRequest;
use rusqlite::{
  Connection,
  functions::FunctionFlags,
  types::{Value, ValueRef},
};

// ─── Case folding ────────────────────────────────────────────────────────────

/// Name of the SQL function that lowercases text with Unicode rules.
pub const CASEFOLD_FN: &str = "casefold";

/// Register [`CASEFOLD_FN`] on `conn`. Text is lowercased, numbers are
/// rendered as text, NULL and blobs stay NULL.
pub fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    CASEFOLD_FN,
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      Ok(match ctx.get_raw(0) {
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).to_lowercase()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(r) => Some(r.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
      })
    },
  )
}

/// `casefold(column) LIKE casefold(?)`
fn like(column: &str) -> String {
  format!("{CASEFOLD_FN}({column}) LIKE {CASEFOLD_FN}(?)")
}

// ─── Filter values ───────────────────────────────────────────────────────────

/// A single bindable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
  Text(String),
  Integer(i64),
  Real(f64),
}

impl From<Scalar> for Value {
  fn from(s: Scalar) -> Self {
    match s {
      Scalar::Text(t) => Value::Text(t),
      Scalar::Integer(i) => Value::Integer(i),
      Scalar::Real(r) => Value::Real(r),
    }
  }
}

impl From<&str> for Scalar {
  fn from(s: &str) -> Self { Scalar::Text(s.to_owned()) }
}

impl From<String> for Scalar {
  fn from(s: String) -> Self { Scalar::Text(s) }
}

impl From<i64> for Scalar {
  fn from(i: i64) -> Self { Scalar::Integer(i) }
}

impl From<i32> for Scalar {
  fn from(i: i32) -> Self { Scalar::Integer(i64::from(i)) }
}

impl From<f64> for Scalar {
  fn from(r: f64) -> Self { Scalar::Real(r) }
}

/// The value side of a filter.
///
/// - a scalar without `%` becomes `column = ?`
/// - a text scalar containing `%` becomes a case-insensitive `LIKE` on
///   `column`, bound with its `%` markers intact
/// - a list becomes `column IN (?, ?, ...)` in list order; an empty list
///   becomes the always-false `1 = 0`
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
  Scalar(Scalar),
  List(Vec<Scalar>),
}

impl FilterValue {
  /// Empty text means "no filter", the same as an absent value.
  fn is_blank(&self) -> bool {
    matches!(self, FilterValue::Scalar(Scalar::Text(t)) if t.is_empty())
  }
}

macro_rules! filter_value_from {
  ($($t:ty),*) => {
    $(
      impl From<$t> for FilterValue {
        fn from(v: $t) -> Self { FilterValue::Scalar(v.into()) }
      }

      impl From<Vec<$t>> for FilterValue {
        fn from(vs: Vec<$t>) -> Self {
          FilterValue::List(vs.into_iter().map(Into::into).collect())
        }
      }
    )*
  };
}

filter_value_from!(&str, String, i64, i32, f64);

// ─── WHERE clause ────────────────────────────────────────────────────────────

/// An AND-joined predicate plus its parameters, in placeholder order.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
  conditions: Vec<String>,
  params:     Vec<Value>,
}

impl WhereClause {
  pub fn new() -> Self { Self::default() }

  /// Build from `(column, value)` pairs, keeping their order.
  pub fn from_filters<I>(filters: I) -> Self
  where
    I: IntoIterator<Item = (&'static str, Option<FilterValue>)>,
  {
    let mut clause = Self::new();
    for (column, value) in filters {
      clause.filter(column, value);
    }
    clause
  }

  /// Add one filter. `None` and empty text are ignored.
  pub fn filter(
    &mut self,
    column: &'static str,
    value: Option<FilterValue>,
  ) -> &mut Self {
    let Some(value) = value.filter(|v| !v.is_blank()) else {
      return self;
    };

    match value {
      FilterValue::List(items) if items.is_empty() => {
        self.conditions.push("1 = 0".to_owned());
      }
      FilterValue::List(items) => {
        let placeholders = vec!["?"; items.len()].join(", ");
        self.conditions.push(format!("{column} IN ({placeholders})"));
        self.params.extend(items.into_iter().map(Value::from));
      }
      FilterValue::Scalar(Scalar::Text(t)) if t.contains('%') => {
        self.conditions.push(like(column));
        self.params.push(Value::Text(t));
      }
      FilterValue::Scalar(s) => {
        self.conditions.push(format!("{column} = ?"));
        self.params.push(s.into());
      }
    }
    self
  }

  /// Add an equality predicate regardless of `%` in the value. Used for
  /// columns that are only ever matched exactly.
  pub fn exact(
    &mut self,
    column: &'static str,
    value: Option<impl Into<Scalar>>,
  ) -> &mut Self {
    if let Some(value) = value {
      let scalar: Scalar = value.into();
      self.conditions.push(format!("{column} = ?"));
      self.params.push(scalar.into());
    }
    self
  }

  /// Add a fixed predicate with its own parameters, e.g.
  /// `("expires_at > ?", [now])`.
  pub fn condition(&mut self, sql: &'static str, params: Vec<Value>) -> &mut Self {
    self.conditions.push(sql.to_owned());
    self.params.extend(params);
    self
  }

  /// Match `pattern` case-insensitively against any of `columns`, e.g.
  /// `(casefold(title) LIKE casefold(?) OR ...)`. The pattern is bound once per
  /// column. `None` and empty patterns are ignored.
  pub fn any_like(
    &mut self,
    columns: &[&'static str],
    pattern: Option<String>,
  ) -> &mut Self {
    let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
      return self;
    };
    if columns.is_empty() {
      return self;
    }

    let ors: Vec<String> =
      columns.iter().map(|c| like(c)).collect();
    self.conditions.push(format!("({})", ors.join(" OR ")));
    self
      .params
      .extend(columns.iter().map(|_| Value::Text(pattern.clone())));
    self
  }

  pub fn is_empty(&self) -> bool { self.conditions.is_empty() }

  /// `WHERE a AND b ...`, or the empty string when there are no conditions.
  pub fn sql(&self) -> String {
    if self.conditions.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conditions.join(" AND "))
    }
  }

  pub fn params(&self) -> &[Value] { &self.params }

  pub fn into_parts(self) -> (String, Vec<Value>) {
    let sql = self.sql();
    (sql, self.params)
  }
}

/// Wrap `value` in `%...%` for a substring match, or `None` when blank.
pub fn contains_pattern(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(|v| format!("%{v}%"))
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Ordering used when the caller does not supply one; keeps pages stable.
pub const DEFAULT_ORDER: &str = "id DESC";

/// A query with `ORDER BY ... LIMIT ? OFFSET ?` appended.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedQuery {
  pub sql:    String,
  pub params: Vec<Value>,
  pub page:   u32,
  pub limit:  u32,
}

/// Append deterministic ordering and a page window to `base`.
///
/// `order_by` is static text; it defaults to [`DEFAULT_ORDER`].
pub fn paginate(
  base: &str,
  mut params: Vec<Value>,
  page: PageRequest,
  order_by: Option<&'static str>,
) -> PaginatedQuery {
  let order = order_by.unwrap_or(DEFAULT_ORDER);
  params.push(Value::Integer(i64::from(page.limit)));
  params.push(Value::Integer(
    i64::try_from(page.offset()).unwrap_or(i64::MAX),
  ));

  PaginatedQuery {
    sql: format!("{base} ORDER BY {order} LIMIT ? OFFSET ?"),
    params,
    page: page.page,
    limit: page.limit,
  }
}

// ─── Raw execution results ───────────────────────────────────────────────────

/// Whether a statement returns rows or changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
  Read,
  Write,
}

impl QueryKind {
  /// Classify by the leading keyword.
  pub fn classify(sql: &str) -> Self {
    let keyword = sql
      .trim_start()
      .split(|c: char| c.is_whitespace() || c == '(')
      .next()
      .unwrap_or_default()
      .to_ascii_uppercase();

    match keyword.as_str() {
      "SELECT" | "WITH" | "PRAGMA" | "VALUES" | "EXPLAIN" => Self::Read,
      _ => Self::Write,
    }
  }
}

/// Uniform result of [`crate::SqliteStore::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
  pub kind:           QueryKind,
  /// Rows keyed by column name; always empty for writes.
  pub rows:           Vec<serde_json::Map<String, serde_json::Value>>,
  /// Rows returned for reads, rows affected for writes.
  pub row_count:      usize,
  pub last_insert_id: Option<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

  #[test]
  fn no_filters_emits_no_where() {
    let clause = WhereClause::from_filters([("country", None), ("type", None)]);
    assert!(clause.is_empty());
    assert_eq!(clause.sql(), "");
    assert!(clause.params().is_empty());
  }

  #[test]
  fn scalar_filters_keep_supplied_order() {
    let clause = WhereClause::from_filters([
      ("type", Some("policy".into())),
      ("sector", None),
      ("country", Some("Kenya".into())),
      ("year", Some(2021_i64.into())),
    ]);
    assert_eq!(clause.sql(), "WHERE type = ? AND country = ? AND year = ?");
    assert_eq!(
      clause.params(),
      &[text("policy"), text("Kenya"), Value::Integer(2021)]
    );
  }

  #[test]
  fn empty_string_is_absent() {
    let clause = WhereClause::from_filters([
      ("country", Some("".into())),
      ("type", Some("report".into())),
    ]);
    assert_eq!(clause.sql(), "WHERE type = ?");
    assert_eq!(clause.params().len(), 1);
  }

  #[test]
  fn wildcard_uses_like_and_binds_literal() {
    let clause = WhereClause::from_filters([("sector", Some("%energy%".into()))]);
    assert_eq!(clause.sql(), "WHERE casefold(sector) LIKE casefold(?)");
    assert_eq!(clause.params(), &[text("%energy%")]);
  }

  #[test]
  fn list_binds_each_element_in_order() {
    let clause = WhereClause::from_filters([
      ("type", Some("policy".into())),
      ("id", Some(vec![7_i64, 3, 9].into())),
    ]);
    assert_eq!(clause.sql(), "WHERE type = ? AND id IN (?, ?, ?)");
    assert_eq!(
      clause.params(),
      &[
        text("policy"),
        Value::Integer(7),
        Value::Integer(3),
        Value::Integer(9),
      ]
    );
  }

  #[test]
  fn empty_list_matches_nothing() {
    let clause =
      WhereClause::from_filters([("id", Some(Vec::<i64>::new().into()))]);
    assert_eq!(clause.sql(), "WHERE 1 = 0");
    assert!(clause.params().is_empty());
  }

  #[test]
  fn injection_attempt_is_bound_not_spliced() {
    let evil = "x' OR '1'='1";
    let clause = WhereClause::from_filters([("country", Some(evil.into()))]);
    assert!(!clause.sql().contains(evil));
    assert_eq!(clause.params(), &[text(evil)]);
  }

  #[test]
  fn any_like_binds_pattern_per_column() {
    let mut clause = WhereClause::new();
    clause
      .filter("type", Some("research".into()))
      .any_like(&["title", "description"], contains_pattern(Some(" drought ")));
    assert_eq!(
      clause.sql(),
      "WHERE type = ? AND (casefold(title) LIKE casefold(?) \
       OR casefold(description) LIKE casefold(?))"
    );
    assert_eq!(
      clause.params(),
      &[text("research"), text("%drought%"), text("%drought%")]
    );
  }

  #[test]
  fn exact_never_switches_to_like() {
    let mut clause = WhereClause::new();
    clause.exact("country", Some("%ya")).exact("year", None::<i64>);
    assert_eq!(clause.sql(), "WHERE country = ?");
    assert_eq!(clause.params(), &[text("%ya")]);
  }

  #[test]
  fn casefold_matches_accented_text_across_case() {
    let conn = Connection::open_in_memory().unwrap();
    register_casefold(&conn).unwrap();
    let (where_sql, params) = WhereClause::from_filters([(
      "title",
      contains_pattern(Some("énergie VERTE")).map(Into::into),
    )])
    .into_parts();

    let hits: i64 = conn
      .query_row(
        &format!("SELECT COUNT(*) FROM (SELECT 'Énergie verte' AS title) {where_sql}"),
        rusqlite::params_from_iter(params),
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(hits, 1);

    let folded: Option<String> = conn
      .query_row("SELECT casefold(NULL)", [], |row| row.get(0))
      .unwrap();
    assert_eq!(folded, None);
  }

  #[test]
  fn contains_pattern_ignores_blank() {
    assert_eq!(contains_pattern(None), None);
    assert_eq!(contains_pattern(Some("   ")), None);
    assert_eq!(contains_pattern(Some("agri")).as_deref(), Some("%agri%"));
  }

  #[test]
  fn paginate_defaults_to_id_desc() {
    let q = paginate(
      "SELECT * FROM repository_items",
      vec![],
      PageRequest::default(),
      None,
    );
    assert_eq!(
      q.sql,
      "SELECT * FROM repository_items ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    assert_eq!(q.params, vec![Value::Integer(10), Value::Integer(0)]);
    assert_eq!((q.page, q.limit), (1, 10));
  }

  #[test]
  fn paginate_appends_window_after_filter_params() {
    let (where_sql, params) =
      WhereClause::from_filters([("type", Some("policy".into()))]).into_parts();
    let q = paginate(
      &format!("SELECT * FROM repository_items {where_sql}"),
      params,
      PageRequest::new(Some(2), Some(10)),
      Some("year DESC"),
    );
    assert!(q.sql.ends_with("ORDER BY year DESC LIMIT ? OFFSET ?"));
    assert_eq!(
      q.params,
      vec![text("policy"), Value::Integer(10), Value::Integer(10)]
    );
  }

  #[test]
  fn classify_reads_and_writes() {
    assert_eq!(QueryKind::classify("  select 1"), QueryKind::Read);
    assert_eq!(QueryKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"), QueryKind::Read);
    assert_eq!(QueryKind::classify("PRAGMA user_version"), QueryKind::Read);
    assert_eq!(QueryKind::classify("INSERT INTO t VALUES (1)"), QueryKind::Write);
    assert_eq!(QueryKind::classify("delete from t"), QueryKind::Write);
    assert_eq!(QueryKind::classify(""), QueryKind::Write);
  }
}
