//! Cache schema definitions

/// SQL to create all tables
/// NOTE: payloads are stored as JSON text so Decimal prices keep their precision
pub const CREATE_TABLES: &str = r#"
-- Provider payload cache
CREATE TABLE IF NOT EXISTS cache_entries (
    cache_key TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    stored_at INTEGER NOT NULL
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_cache_kind ON cache_entries(kind);
CREATE INDEX IF NOT EXISTS idx_cache_stored_at ON cache_entries(stored_at)
"#;
