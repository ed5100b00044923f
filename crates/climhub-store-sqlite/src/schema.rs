//! SQL schema for the climate hub SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS repository_items (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL CHECK (length(title) <= 500),
    type        TEXT NOT NULL CHECK (type IN ('policy', 'report', 'research')),
    country     TEXT,
    year        INTEGER,
    description TEXT,
    source      TEXT,
    link        TEXT,
    file_path   TEXT,
    sector      TEXT,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, millisecond precision
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_repository_type    ON repository_items(type);
CREATE INDEX IF NOT EXISTS idx_repository_country ON repository_items(country);
CREATE INDEX IF NOT EXISTS idx_repository_year    ON repository_items(year);
CREATE INDEX IF NOT EXISTS idx_repository_sector  ON repository_items(sector);

CREATE TABLE IF NOT EXISTS policy_analysis (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    country          TEXT NOT NULL,
    governance_score REAL CHECK (governance_score IS NULL OR governance_score BETWEEN 0 AND 100),
    mitigation_score REAL CHECK (mitigation_score IS NULL OR mitigation_score BETWEEN 0 AND 100),
    adaptation_score REAL CHECK (adaptation_score IS NULL OR adaptation_score BETWEEN 0 AND 100),
    overall_index    REAL CHECK (overall_index    IS NULL OR overall_index    BETWEEN 0 AND 100),
    source           TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (country, source)
);

CREATE INDEX IF NOT EXISTS idx_policy_analysis_country ON policy_analysis(country);

-- month = 0 marks an annual aggregate. NULL would defeat the UNIQUE key,
-- since SQLite treats NULLs as distinct.
CREATE TABLE IF NOT EXISTS cached_climate_data (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    country     TEXT NOT NULL,
    metric      TEXT NOT NULL,
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL DEFAULT 0 CHECK (month BETWEEN 0 AND 12),
    value       REAL,
    data_source TEXT,
    raw_data    TEXT,            -- provider response, JSON
    cached_at   TEXT NOT NULL,
    expires_at  TEXT,            -- NULL reads as expired
    UNIQUE (country, metric, year, month)
);

CREATE INDEX IF NOT EXISTS idx_climate_country_metric
    ON cached_climate_data(country, metric, year);

PRAGMA user_version = 1;
";
