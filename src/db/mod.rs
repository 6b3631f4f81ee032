use chrono::{DateTime, SubsecRound, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};

use crate::models::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("stored {column} is not a valid identifier: '{value}'")]
    CorruptIdentifier { column: &'static str, value: String },

    #[error("stored timestamp out of range: {0}")]
    CorruptTimestamp(i64),
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS pitchers (
           id TEXT PRIMARY KEY NOT NULL,
           name TEXT NOT NULL CHECK (name <> ''),
           team TEXT,
           hand TEXT,
           created_at INTEGER NOT NULL
       )"#,
    r#"CREATE TABLE IF NOT EXISTS pitches (
           id TEXT PRIMARY KEY NOT NULL,
           pitcher_id TEXT NOT NULL,
           x REAL NOT NULL,
           y REAL NOT NULL,
           in_zone INTEGER NOT NULL,
           type TEXT NOT NULL,
           result TEXT NOT NULL,
           speed_kph REAL,
           ts INTEGER NOT NULL
       )"#,
];

const INDEXES: &[(&str, &str)] = &[
    (
        "idx_pitches_pitcher_ts",
        "CREATE INDEX IF NOT EXISTS idx_pitches_pitcher_ts ON pitches (pitcher_id ASC, ts DESC)",
    ),
    (
        "idx_pitches_result",
        "CREATE INDEX IF NOT EXISTS idx_pitches_result ON pitches (result)",
    ),
    (
        "idx_pitches_type",
        "CREATE INDEX IF NOT EXISTS idx_pitches_type ON pitches (type)",
    ),
];

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Handle to the `pitchers` and `pitches` collections. Cloning shares the pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct PitcherRow {
    id: String,
    name: String,
    team: Option<String>,
    hand: Option<String>,
    created_at: i64,
}

impl PitcherRow {
    fn to_pitcher(&self) -> Result<Pitcher, StoreError> {
        Ok(Pitcher {
            id: decode_id("id", &self.id)?,
            name: self.name.clone(),
            team: self.team.clone(),
            hand: self.hand.clone(),
            created_at: decode_ts(self.created_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PitchRow {
    id: String,
    pitcher_id: String,
    x: f64,
    y: f64,
    in_zone: bool,
    #[sqlx(rename = "type")]
    pitch_type: String,
    result: String,
    speed_kph: Option<f64>,
    ts: i64,
}

impl PitchRow {
    fn to_pitch(&self) -> Result<Pitch, StoreError> {
        Ok(Pitch {
            id: decode_id("id", &self.id)?,
            pitcher_id: decode_id("pitcher_id", &self.pitcher_id)?,
            x: self.x,
            y: self.y,
            in_zone: self.in_zone,
            pitch_type: self.pitch_type.clone(),
            result: self.result.clone(),
            speed_kph: self.speed_kph,
            ts: decode_ts(self.ts)?,
        })
    }
}

fn decode_id(column: &'static str, value: &str) -> Result<Id, StoreError> {
    parse_identifier(column, value).map_err(|_| StoreError::CorruptIdentifier {
        column,
        value: value.to_string(),
    })
}

fn decode_ts(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros).ok_or(StoreError::CorruptTimestamp(micros))
}

/// Current time at storage precision, so a returned record equals its re-read form.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Store {
    /// Connect and create the collections if needed.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(database_url).await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database. It lives only as long as its connection, so the
    /// pool holds exactly one and never recycles it.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(IN_MEMORY_URL)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.create_schema().await?;
        tracing::info!("Store opened.");
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.iter().copied() {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Secondary indexes on `pitches`. Failures are logged and skipped.
    pub async fn ensure_indexes(&self) {
        for &(name, statement) in INDEXES {
            if let Err(e) = sqlx::query(statement).execute(&self.pool).await {
                tracing::warn!("Index init warning ({}): {}", name, e);
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Store closed.");
    }

    // Pitcher queries
    pub async fn insert_pitcher(&self, new: NewPitcher) -> Result<Pitcher, StoreError> {
        let pitcher = Pitcher {
            id: id::new_identifier(),
            name: new.name,
            team: new.team,
            hand: new.hand,
            created_at: now(),
        };

        sqlx::query(
            r#"INSERT INTO pitchers (id, name, team, hand, created_at) VALUES (?, ?, ?, ?, ?)"#
        )
        .bind(pitcher.id.to_string())
        .bind(&pitcher.name)
        .bind(pitcher.team.as_deref())
        .bind(pitcher.hand.as_deref())
        .bind(pitcher.created_at.timestamp_micros())
        .execute(&self.pool)
        .await?;

        Ok(pitcher)
    }

    /// Most recently created first
    pub async fn list_pitchers(&self) -> Result<Vec<Pitcher>, StoreError> {
        let rows = sqlx::query_as::<_, PitcherRow>(
            r#"SELECT id, name, team, hand, created_at FROM pitchers
               ORDER BY created_at DESC, rowid DESC"#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(PitcherRow::to_pitcher).collect()
    }

    // Pitch queries
    pub async fn insert_pitch(&self, new: NewPitch) -> Result<Pitch, StoreError> {
        let pitch = Pitch {
            id: id::new_identifier(),
            pitcher_id: new.pitcher_id,
            x: new.x,
            y: new.y,
            in_zone: new.in_zone,
            pitch_type: new.pitch_type,
            result: new.result,
            speed_kph: new.speed_kph,
            ts: now(),
        };

        sqlx::query(
            r#"INSERT INTO pitches (id, pitcher_id, x, y, in_zone, type, result, speed_kph, ts)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(pitch.id.to_string())
        .bind(pitch.pitcher_id.to_string())
        .bind(pitch.x)
        .bind(pitch.y)
        .bind(pitch.in_zone)
        .bind(&pitch.pitch_type)
        .bind(&pitch.result)
        .bind(pitch.speed_kph)
        .bind(pitch.ts.timestamp_micros())
        .execute(&self.pool)
        .await?;

        Ok(pitch)
    }

    /// Newest first, filtered, one page at a time. Equal timestamps fall back to
    /// insertion order so consecutive pages never overlap.
    pub async fn list_pitches(
        &self,
        filter: &PitchFilter,
        pagination: Pagination,
    ) -> Result<Vec<Pitch>, StoreError> {
        let mut builder = pitch_query(filter);
        builder
            .push(" ORDER BY ts DESC, rowid DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = builder
            .build_query_as::<PitchRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(PitchRow::to_pitch).collect()
    }
}

fn pitch_query(filter: &PitchFilter) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(
        "SELECT id, pitcher_id, x, y, in_zone, type, result, speed_kph, ts \
         FROM pitches WHERE 1 = 1",
    );

    if let Some(pitcher_id) = filter.pitcher_id {
        builder.push(" AND pitcher_id = ").push_bind(pitcher_id.to_string());
    }
    if let Some(result) = &filter.result {
        builder.push(" AND result = ").push_bind(result.clone());
    }
    if let Some(pitch_type) = &filter.pitch_type {
        builder.push(" AND type = ").push_bind(pitch_type.clone());
    }
    if let Some(in_zone) = filter.in_zone {
        builder.push(" AND in_zone = ").push_bind(in_zone);
    }
    if let Some(from) = filter.from {
        builder.push(" AND ts >= ").push_bind(from.timestamp_micros());
    }
    if let Some(to) = filter.to {
        builder.push(" AND ts <= ").push_bind(to.timestamp_micros());
    }

    builder
}
