use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Players
CREATE TABLE IF NOT EXISTS accounts (
    id            BIGSERIAL PRIMARY KEY,
    username      TEXT UNIQUE NOT NULL,
    email         TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    rating        INTEGER NOT NULL DEFAULT 1200 CHECK (rating >= 100),
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_accounts_email_lower
    ON accounts (LOWER(email));
CREATE INDEX IF NOT EXISTS idx_accounts_username_lower
    ON accounts (LOWER(username));
CREATE INDEX IF NOT EXISTS idx_accounts_rating
    ON accounts (rating DESC, id);

-- Game sessions created by matchmaking
CREATE TABLE IF NOT EXISTS matches (
    id            BIGSERIAL PRIMARY KEY,
    white_id      BIGINT NOT NULL REFERENCES accounts(id),
    black_id      BIGINT NOT NULL REFERENCES accounts(id),
    status        TEXT NOT NULL DEFAULT 'IN_PROGRESS',
    current_ply   INTEGER NOT NULL DEFAULT 0,
    fen_current   TEXT NOT NULL,
    last_move_uci TEXT,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    finished_at   TIMESTAMPTZ,
    CHECK (white_id <> black_id)
);

CREATE INDEX IF NOT EXISTS idx_matches_white_id ON matches (white_id);
CREATE INDEX IF NOT EXISTS idx_matches_black_id ON matches (black_id);

-- Move log, one row per ply
CREATE TABLE IF NOT EXISTS moves (
    id          BIGSERIAL PRIMARY KEY,
    match_id    BIGINT NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
    ply         INTEGER NOT NULL,
    move_number INTEGER NOT NULL,
    color       TEXT NOT NULL,
    uci         TEXT NOT NULL,
    san         TEXT NOT NULL,
    fen_before  TEXT NOT NULL,
    fen_after   TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE(match_id, ply)
);
"#;
