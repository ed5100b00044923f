//! [`SqliteStore`], the SQLite implementation of [`HubStore`].

use std::{path::Path, time::Duration, time::Instant};

use chrono::{TimeDelta, Utc};
use rusqlite::{Row, params_from_iter, types::Value};

use climhub_core::{
  analysis::{AnalysisFilter, PolicyAnalysis, RankingEntry, ScoreMetric},
  climate::{
    ClimateIndicator, ClimateLookup, ClimateQuery, ClimateRecord,
    NewClimateMetric,
  },
  item::{ItemFilter, ItemType, RepositoryItem},
  seed::{SeedData, SeedReport},
  stats::{SectorSummary, StatsOverview},
  store::HubStore,
};

use crate::{
  Result,
  encode::{
    ANALYSIS_COLUMNS, CLIMATE_COLUMNS, ITEM_COLUMNS, RawAnalysis, RawClimate,
    RawItem, decode_month, encode_dt, encode_month, row_to_json,
  },
  query::{
    QueryKind, QueryOutcome, WhereClause, contains_pattern, paginate,
    register_casefold,
  },
  schema::SCHEMA,
};

/// Ordering of every repository item listing.
const ITEM_ORDER: &str = "year DESC, created_at DESC, id DESC";

/// How many readings the map indicator view returns.
const INDICATOR_LIMIT: i64 = 12;

// ─── Options ─────────────────────────────────────────────────────────────────

/// Tunables applied when the connection is opened.
#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// How long a statement waits on a locked database before failing.
  pub busy_timeout: Duration,
  /// Lifetime of a cache row written without an explicit `expires_at`.
  pub cache_ttl:    TimeDelta,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      busy_timeout: Duration::from_secs(5),
      cache_ttl:    TimeDelta::hours(24),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A climate hub store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Statements
/// from all clones are serialised on one background thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  cache_ttl: TimeDelta,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, cache_ttl: options.cache_ttl };
    store.init(options.busy_timeout).await?;
    Ok(store)
  }

  /// Open an empty in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let options = StoreOptions::default();
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, cache_ttl: options.cache_ttl };
    store.init(options.busy_timeout).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        register_casefold(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the connection. Other clones fail every call afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Run an arbitrary parameterised statement.
  ///
  /// Reads come back as JSON objects keyed by column name; writes report the
  /// number of affected rows and the last inserted rowid.
  pub async fn execute(
    &self,
    sql: impl Into<String>,
    params: Vec<Value>,
  ) -> Result<QueryOutcome> {
    let sql = sql.into();
    let kind = QueryKind::classify(&sql);
    let started = Instant::now();
    let logged = sql.clone();

    let outcome = self
      .conn
      .call(move |conn| match kind {
        QueryKind::Read => {
          let mut stmt = conn.prepare(&sql)?;
          let names: Vec<String> =
            stmt.column_names().into_iter().map(str::to_owned).collect();
          let rows = stmt
            .query_map(params_from_iter(params), |row| row_to_json(row, &names))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(QueryOutcome {
            kind,
            row_count: rows.len(),
            rows,
            last_insert_id: None,
          })
        }
        QueryKind::Write => {
          let changed = conn.execute(&sql, params_from_iter(params))?;
          Ok(QueryOutcome {
            kind,
            rows: Vec::new(),
            row_count: changed,
            last_insert_id: Some(conn.last_insert_rowid()),
          })
        }
      })
      .await?;

    log_query(&logged, started, outcome.row_count);
    Ok(outcome)
  }

  /// Run a read and map every row with `map`.
  async fn fetch<T, F>(&self, sql: String, params: Vec<Value>, map: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let started = Instant::now();
    let logged = sql.clone();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    log_query(&logged, started, rows.len());
    Ok(rows)
  }

  async fn fetch_items(&self, sql: String, params: Vec<Value>) -> Result<Vec<RepositoryItem>> {
    self
      .fetch(sql, params, RawItem::from_row)
      .await?
      .into_iter()
      .map(RawItem::into_item)
      .collect()
  }

  async fn fetch_analyses(
    &self,
    sql: String,
    params: Vec<Value>,
  ) -> Result<Vec<PolicyAnalysis>> {
    self
      .fetch(sql, params, RawAnalysis::from_row)
      .await?
      .into_iter()
      .map(RawAnalysis::into_analysis)
      .collect()
  }

  async fn fetch_strings(&self, sql: &str) -> Result<Vec<String>> {
    self.fetch(sql.to_owned(), Vec::new(), |row| row.get(0)).await
  }
}

fn log_query(sql: &str, started: Instant, rows: usize) {
  let text: String = sql
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .chars()
    .take(100)
    .collect();
  tracing::debug!(
    sql = %text,
    elapsed_ms = started.elapsed().as_millis() as u64,
    rows,
    "executed query"
  );
}

// ─── HubStore impl ───────────────────────────────────────────────────────────

impl HubStore for SqliteStore {
  type Error = crate::Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Repository items ──────────────────────────────────────────────────────

  async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<RepositoryItem>> {
    let mut clause = WhereClause::new();
    clause
      .exact("type", filter.item_type.as_ref().map(AsRef::<str>::as_ref))
      .exact("country", filter.country.clone().filter(|c| !c.is_empty()))
      .exact("year", filter.year)
      .any_like(&["title", "description"], contains_pattern(filter.search.as_deref()))
      .filter("sector", contains_pattern(filter.sector.as_deref()).map(Into::into));
    let (where_sql, params) = clause.into_parts();

    let base = format!("SELECT {ITEM_COLUMNS} FROM repository_items {where_sql}");
    let (sql, params) = match filter.page {
      Some(page) => {
        let q = paginate(&base, params, page, Some(ITEM_ORDER));
        (q.sql, q.params)
      }
      None => (format!("{base} ORDER BY {ITEM_ORDER}"), params),
    };

    self.fetch_items(sql, params).await
  }

  async fn get_item(&self, id: i64) -> Result<Option<RepositoryItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM repository_items WHERE id = ?");
    let mut items = self.fetch_items(sql, vec![Value::Integer(id)]).await?;
    Ok(items.pop())
  }

  async fn list_by_type(
    &self,
    item_type: ItemType,
    country: Option<String>,
  ) -> Result<Vec<RepositoryItem>> {
    let mut clause = WhereClause::new();
    clause
      .exact("type", Some(AsRef::<str>::as_ref(&item_type)))
      .exact("country", country.filter(|c| !c.is_empty()));
    let (where_sql, params) = clause.into_parts();

    let sql = format!(
      "SELECT {ITEM_COLUMNS} FROM repository_items {where_sql} ORDER BY year DESC, id DESC"
    );
    self.fetch_items(sql, params).await
  }

  async fn distinct_countries(&self) -> Result<Vec<String>> {
    self
      .fetch_strings(
        "SELECT DISTINCT TRIM(country) AS country
         FROM repository_items
         WHERE country IS NOT NULL AND TRIM(country) <> ''
         ORDER BY casefold(country), country",
      )
      .await
  }

  async fn distinct_sectors(&self) -> Result<Vec<String>> {
    self
      .fetch_strings(
        "SELECT DISTINCT TRIM(sector) AS sector
         FROM repository_items
         WHERE sector IS NOT NULL AND TRIM(sector) <> ''
         ORDER BY casefold(sector), sector",
      )
      .await
  }

  async fn compare_policies(&self, ids: Vec<i64>) -> Result<Vec<RepositoryItem>> {
    let mut clause = WhereClause::new();
    clause
      .filter("id", Some(ids.into()))
      .exact("type", Some(AsRef::<str>::as_ref(&ItemType::Policy)));
    let (where_sql, params) = clause.into_parts();

    let sql = format!(
      "SELECT {ITEM_COLUMNS} FROM repository_items {where_sql} ORDER BY year DESC, id DESC"
    );
    self.fetch_items(sql, params).await
  }

  async fn policies_by_country(&self, country: String) -> Result<Vec<RepositoryItem>> {
    self.list_by_type(ItemType::Policy, Some(country)).await
  }

  // ── Policy analysis ───────────────────────────────────────────────────────

  async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<Vec<PolicyAnalysis>> {
    let mut clause = WhereClause::new();
    clause
      .exact("country", filter.country.clone().filter(|c| !c.is_empty()))
      .filter("source", contains_pattern(filter.source.as_deref()).map(Into::into));
    let (where_sql, params) = clause.into_parts();

    let sql = format!(
      "SELECT {ANALYSIS_COLUMNS} FROM policy_analysis {where_sql}
       ORDER BY overall_index DESC, country ASC"
    );
    self.fetch_analyses(sql, params).await
  }

  async fn analyses_for_country(&self, country: String) -> Result<Vec<PolicyAnalysis>> {
    let sql = format!(
      "SELECT {ANALYSIS_COLUMNS} FROM policy_analysis WHERE country = ? ORDER BY source DESC"
    );
    self.fetch_analyses(sql, vec![Value::Text(country)]).await
  }

  async fn compare_countries(&self, countries: Vec<String>) -> Result<Vec<PolicyAnalysis>> {
    let (where_sql, params) =
      WhereClause::from_filters([("country", Some(countries.into()))]).into_parts();

    let sql = format!(
      "SELECT {ANALYSIS_COLUMNS} FROM policy_analysis {where_sql}
       ORDER BY overall_index DESC, country ASC"
    );
    self.fetch_analyses(sql, params).await
  }

  async fn ranking(&self, metric: ScoreMetric) -> Result<Vec<RankingEntry>> {
    // The column name comes from the closed ScoreMetric enum, never from the
    // request.
    let column = metric.column();
    let sql = format!(
      "SELECT country, {column}, source
       FROM policy_analysis
       WHERE {column} IS NOT NULL
       ORDER BY {column} DESC, country ASC"
    );

    self
      .fetch(sql, Vec::new(), move |row| {
        Ok(RankingEntry {
          country: row.get(0)?,
          metric,
          value: row.get(1)?,
          source: row.get(2)?,
        })
      })
      .await
  }

  // ── Climate cache ─────────────────────────────────────────────────────────

  async fn climate_lookup(&self, query: &ClimateQuery) -> Result<ClimateLookup> {
    let now = encode_dt(Utc::now());
    let mut clause = WhereClause::new();
    clause
      .exact("country", Some(query.country.clone()))
      .exact("metric", Some(query.metric.clone()))
      .condition("expires_at > ?", vec![Value::Text(now)])
      .exact("year", query.year)
      .exact("month", query.month.map(|m| encode_month(Some(m))));
    let (where_sql, params) = clause.into_parts();

    let sql = format!(
      "SELECT {CLIMATE_COLUMNS} FROM cached_climate_data {where_sql}
       ORDER BY year DESC, month DESC"
    );
    let rows = self
      .fetch(sql, params, RawClimate::from_row)
      .await?
      .into_iter()
      .map(RawClimate::into_record)
      .collect::<Result<Vec<_>>>()?;

    Ok(ClimateLookup::from_rows(rows))
  }

  async fn climate_metrics(&self) -> Result<Vec<String>> {
    self
      .fetch_strings("SELECT DISTINCT metric FROM cached_climate_data ORDER BY metric")
      .await
  }

  async fn upsert_climate_metric(&self, input: NewClimateMetric) -> Result<ClimateRecord> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let expires_str = encode_dt(input.expires_at.unwrap_or(now + self.cache_ttl));
    let raw_data = input.raw_data.as_ref().map(serde_json::to_string).transpose()?;
    let month = encode_month(input.month);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM cached_climate_data
           WHERE country = ?1 AND metric = ?2
             AND (expires_at IS NULL OR expires_at <= ?3)",
          rusqlite::params![input.country, input.metric, now_str],
        )?;
        tx.execute(
          "INSERT INTO cached_climate_data
             (country, metric, year, month, value, data_source, raw_data, cached_at, expires_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (country, metric, year, month) DO UPDATE SET
             value       = excluded.value,
             data_source = excluded.data_source,
             raw_data    = excluded.raw_data,
             cached_at   = excluded.cached_at,
             expires_at  = excluded.expires_at",
          rusqlite::params![
            input.country,
            input.metric,
            input.year,
            month,
            input.value,
            input.data_source,
            raw_data,
            now_str,
            expires_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!(
            "SELECT {CLIMATE_COLUMNS} FROM cached_climate_data
             WHERE country = ?1 AND metric = ?2 AND year = ?3 AND month = ?4"
          ),
          rusqlite::params![input.country, input.metric, input.year, month],
          RawClimate::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_record()
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn sector_summaries(&self) -> Result<Vec<SectorSummary>> {
    self
      .fetch(
        "SELECT
           TRIM(sector) AS sector,
           COUNT(*) AS total_items,
           SUM(CASE WHEN type = 'policy'   THEN 1 ELSE 0 END) AS total_policies,
           SUM(CASE WHEN type = 'report'   THEN 1 ELSE 0 END) AS total_reports,
           SUM(CASE WHEN type = 'research' THEN 1 ELSE 0 END) AS total_research
         FROM repository_items
         WHERE sector IS NOT NULL AND TRIM(sector) <> ''
         GROUP BY TRIM(sector)
         ORDER BY casefold(TRIM(sector)), TRIM(sector)"
          .to_owned(),
        Vec::new(),
        |row| {
          Ok(SectorSummary {
            sector:         row.get(0)?,
            total_items:    row.get(1)?,
            total_policies: row.get(2)?,
            total_reports:  row.get(3)?,
            total_research: row.get(4)?,
          })
        },
      )
      .await
  }

  async fn climate_indicators(&self, country: String) -> Result<Vec<ClimateIndicator>> {
    let raws: Vec<(String, i32, i64, Option<f64>)> = self
      .fetch(
        "SELECT metric, year, month, value
         FROM cached_climate_data
         WHERE country = ?
         ORDER BY year DESC, month DESC, metric ASC
         LIMIT ?"
          .to_owned(),
        vec![Value::Text(country), Value::Integer(INDICATOR_LIMIT)],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .await?;

    raws
      .into_iter()
      .map(|(metric, year, month, value)| {
        Ok(ClimateIndicator { metric, year, month: decode_month(month)?, value })
      })
      .collect()
  }

  async fn stats_overview(&self) -> Result<StatsOverview> {
    let started = Instant::now();
    let stats = self
      .conn
      .call(|conn| {
        let (total_policies, total_reports, total_research, total_countries) = conn
          .query_row(
            "SELECT
               COALESCE(SUM(CASE WHEN type = 'policy'   THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN type = 'report'   THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN type = 'research' THEN 1 ELSE 0 END), 0),
               COUNT(DISTINCT country)
             FROM repository_items",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
          )?;

        let (countries_analyzed, avg_overall_index, highest_index, lowest_index) = conn
          .query_row(
            "SELECT
               COUNT(DISTINCT country),
               AVG(overall_index),
               MAX(overall_index),
               MIN(overall_index)
             FROM policy_analysis",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
          )?;

        Ok(StatsOverview {
          total_policies,
          total_reports,
          total_research,
          total_countries,
          countries_analyzed,
          avg_overall_index,
          highest_index,
          lowest_index,
        })
      })
      .await?;

    log_query("stats overview", started, 1);
    Ok(stats)
  }

  // ── Bulk load ─────────────────────────────────────────────────────────────

  async fn replace_all(&self, seed: SeedData) -> Result<SeedReport> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let default_expiry = encode_dt(now + self.cache_ttl);

    // Encode everything that can fail before entering the connection thread.
    let climate = seed
      .climate
      .into_iter()
      .map(|c| {
        let raw = c.raw_data.as_ref().map(serde_json::to_string).transpose()?;
        let expires = c.expires_at.map(encode_dt).unwrap_or_else(|| default_expiry.clone());
        Ok((c, raw, expires))
      })
      .collect::<Result<Vec<_>>>()?;
    let items = seed.items;
    let analyses = seed.analyses;

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(
          "DELETE FROM policy_analysis;
           DELETE FROM cached_climate_data;
           DELETE FROM repository_items;
           DELETE FROM sqlite_sequence
             WHERE name IN ('policy_analysis', 'cached_climate_data', 'repository_items');",
        )?;

        {
          let mut stmt = tx.prepare(
            "INSERT INTO repository_items
               (title, type, country, year, description, source, link, file_path, sector,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          )?;
          for item in &items {
            let kind: &str = item.item_type.as_ref();
            stmt.execute(rusqlite::params![
              item.title,
              kind,
              item.country,
              item.year,
              item.description,
              item.source,
              item.link,
              item.file_path,
              item.sector,
              now_str,
            ])?;
          }
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO policy_analysis
               (country, governance_score, mitigation_score, adaptation_score, overall_index,
                source, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          )?;
          for a in &analyses {
            stmt.execute(rusqlite::params![
              a.country,
              a.governance_score,
              a.mitigation_score,
              a.adaptation_score,
              a.overall_index,
              a.source,
              now_str,
            ])?;
          }
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO cached_climate_data
               (country, metric, year, month, value, data_source, raw_data, cached_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for (c, raw, expires) in &climate {
            stmt.execute(rusqlite::params![
              c.country,
              c.metric,
              c.year,
              encode_month(c.month),
              c.value,
              c.data_source,
              raw,
              now_str,
              expires,
            ])?;
          }
        }

        tx.commit()?;
        Ok(SeedReport {
          items:    items.len(),
          analyses: analyses.len(),
          climate:  climate.len(),
        })
      })
      .await?;

    tracing::info!(
      items = report.items,
      analyses = report.analyses,
      climate = report.climate,
      "bulk load complete"
    );
    Ok(report)
  }
}
