use crate::db::{FollowUpStore, GuideStore, OptionStore, PollStore, ResponseStore, StoreError, StoreResult};
use crate::models::{FollowUpQuestion, GuideRecord, Poll, PollOption, PollResponse, PollStatus, StatusChange};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, migrate::MigrateDatabase};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> StoreResult<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;

        Self::with_pool(pool).await
    }

    /// Wraps an existing pool, creating any missing tables.
    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                creator_id TEXT NOT NULL,
                question TEXT NOT NULL,
                category TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS poll_options (
                id TEXT PRIMARY KEY,
                poll_id TEXT NOT NULL,
                text TEXT NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS poll_responses (
                user_id TEXT NOT NULL,
                poll_id TEXT NOT NULL,
                option_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (user_id, poll_id),
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE,
                FOREIGN KEY (option_id) REFERENCES poll_options(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS follow_up_questions (
                id TEXT PRIMARY KEY,
                poll_id TEXT NOT NULL,
                question TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS follow_up_answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                answer TEXT NOT NULL,
                FOREIGN KEY (question_id) REFERENCES follow_up_questions(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guides (
                id TEXT PRIMARY KEY,
                poll_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                category TEXT NOT NULL,
                guide_type TEXT NOT NULL,
                like_count INTEGER NOT NULL DEFAULT 0,
                revote_count INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // Create a new poll together with its options
    pub async fn create_poll(&self, poll: &Poll, options: &[PollOption]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, creator_id, question, category, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&poll.id)
        .bind(&poll.creator_id)
        .bind(&poll.question)
        .bind(&poll.category)
        .bind(poll.status.as_str())
        .bind(poll.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (i, option) in options.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO poll_options (id, poll_id, text, position)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&option.id)
            .bind(&poll.id)
            .bind(&option.text)
            .bind(i as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // Save a response, replacing the user's previous pick on the same poll
    pub async fn save_response(&self, response: &PollResponse) -> StoreResult<()> {
        let option_exists = sqlx::query("SELECT 1 FROM poll_options WHERE id = ? AND poll_id = ?")
            .bind(&response.option_id)
            .bind(&response.poll_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if !option_exists {
            return Err(StoreError::Missing(format!(
                "option {} on poll {}",
                response.option_id, response.poll_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO poll_responses (user_id, poll_id, option_id, timestamp)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, poll_id)
            DO UPDATE SET option_id = excluded.option_id, timestamp = excluded.timestamp
            "#,
        )
        .bind(&response.user_id)
        .bind(&response.poll_id)
        .bind(&response.option_id)
        .bind(response.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_follow_up(&self, question: &FollowUpQuestion) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO follow_up_questions (id, poll_id, question, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&question.id)
        .bind(&question.poll_id)
        .bind(&question.question)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn save_follow_up_answer(&self, question_id: &str, user_id: &str, answer: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO follow_up_answers (question_id, user_id, answer)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(question_id)
        .bind(user_id)
        .bind(answer)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_guides(&self, poll_id: &str) -> StoreResult<Vec<GuideRecord>> {
        sqlx::query(
            r#"
            SELECT id, poll_id, title, content, created_at, category, guide_type, like_count, revote_count
            FROM guides
            WHERE poll_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(guide_from_row)
        .collect()
    }
}

fn parse_timestamp(value: &str, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("Failed to parse {}: {}", column, e)))
}

fn guide_from_row(row: &SqliteRow) -> StoreResult<GuideRecord> {
    let created_at: String = row.try_get("created_at")?;
    Ok(GuideRecord {
        id: row.try_get("id")?,
        poll_id: row.try_get("poll_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: NaiveDate::parse_from_str(&created_at, DATE_FORMAT)
            .map_err(|e| StoreError::Corrupt(format!("Failed to parse created_at: {}", e)))?,
        category: row.try_get("category")?,
        guide_type: row.try_get("guide_type")?,
        like_count: row.try_get("like_count")?,
        revote_count: row.try_get("revote_count")?,
    })
}

#[async_trait]
impl PollStore for Database {
    async fn find_by_id(&self, poll_id: &str) -> StoreResult<Option<Poll>> {
        let row = sqlx::query(
            r#"
            SELECT id, creator_id, question, category, status, created_at
            FROM polls
            WHERE id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status_str: String = row.try_get("status")?;
        let status = PollStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Corrupt(format!("Unknown poll status: {}", status_str)))?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Some(Poll {
            id: row.try_get("id")?,
            creator_id: row.try_get("creator_id")?,
            question: row.try_get("question")?,
            category: row.try_get("category")?,
            status,
            created_at: parse_timestamp(&created_at, "created_at")?,
        }))
    }
}

#[async_trait]
impl OptionStore for Database {
    async fn find_options(&self, poll_id: &str) -> StoreResult<Vec<PollOption>> {
        let rows = sqlx::query(
            r#"
            SELECT id, poll_id, text
            FROM poll_options
            WHERE poll_id = ?
            ORDER BY position
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<PollOption> {
                Ok(PollOption {
                    id: row.try_get("id")?,
                    poll_id: row.try_get("poll_id")?,
                    text: row.try_get("text")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ResponseStore for Database {
    async fn find_responses(&self, poll_id: &str) -> StoreResult<Vec<PollResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, poll_id, option_id, timestamp
            FROM poll_responses
            WHERE poll_id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<PollResponse> {
                let timestamp: String = row.try_get("timestamp")?;
                Ok(PollResponse {
                    user_id: row.try_get("user_id")?,
                    poll_id: row.try_get("poll_id")?,
                    option_id: row.try_get("option_id")?,
                    timestamp: parse_timestamp(&timestamp, "timestamp")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl FollowUpStore for Database {
    async fn find_question(&self, poll_id: &str) -> StoreResult<Option<FollowUpQuestion>> {
        let row = sqlx::query(
            r#"
            SELECT id, poll_id, question
            FROM follow_up_questions
            WHERE poll_id = ?
            ORDER BY created_at, rowid
            LIMIT 1
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> StoreResult<FollowUpQuestion> {
            Ok(FollowUpQuestion {
                id: row.try_get("id")?,
                poll_id: row.try_get("poll_id")?,
                question: row.try_get("question")?,
            })
        })
        .transpose()
    }

    async fn find_answers(&self, question_id: &str) -> StoreResult<Vec<String>> {
        let answers = sqlx::query("SELECT answer FROM follow_up_answers WHERE question_id = ? ORDER BY id")
            .bind(question_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.try_get::<String, _>("answer"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(answers)
    }
}

#[async_trait]
impl GuideStore for Database {
    async fn save(&self, guide: GuideRecord, status_change: StatusChange) -> StoreResult<GuideRecord> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE polls SET status = ? WHERE id = ?")
            .bind(status_change.status.as_str())
            .bind(&status_change.poll_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::Missing(format!("poll {}", status_change.poll_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO guides (id, poll_id, title, content, created_at, category, guide_type, like_count, revote_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&guide.id)
        .bind(&guide.poll_id)
        .bind(&guide.title)
        .bind(&guide.content)
        .bind(guide.created_at.format(DATE_FORMAT).to_string())
        .bind(&guide.category)
        .bind(&guide.guide_type)
        .bind(guide.like_count)
        .bind(guide.revote_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Saved guide {} for poll {}", guide.id, guide.poll_id);
        Ok(guide)
    }
}
