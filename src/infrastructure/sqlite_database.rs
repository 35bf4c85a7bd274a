use async_trait::async_trait;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ReviewStore;
use crate::models::{
    current_time_secs, Comment, Doctor, DoctorView, Hospital, Page, Profession, RatingSummary,
    RecordId, Vote,
};
use crate::votes::{VoteIntent, VoteWrite};

const DOCTOR_VIEW_SELECT: &str = r#"
    SELECT d.id, d.user_id, d.title, d.first_name, d.last_name, d.img, d.about,
           d.profession_id, d.hospital_id, d.experience, d.education, d.contact,
           d.created_at, d.updated_at,
           p.name AS profession_name, h.name AS hospital_name, h.img AS hospital_img
    FROM doctors d
    JOIN professions p ON p.id = d.profession_id
    JOIN hospitals h ON h.id = d.hospital_id
"#;

/// SQLite implementation of the review store
pub struct SqliteReviewStore {
    pool: SqlitePool,
}

impl SqliteReviewStore {
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        // Every connection to :memory: is a separate database
        let in_memory = url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::DatabaseError(format!("Invalid database url {}: {}", url, e)))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            // Readers keep going while one connection holds the write lock
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self { pool };
        store.initialize().await?;
        info!("Review store ready at {}", url);
        Ok(store)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS professions (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS hospitals (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                img TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS doctors (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                title TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                img TEXT NOT NULL DEFAULT '',
                about TEXT NOT NULL DEFAULT '',
                profession_id INTEGER NOT NULL,
                hospital_id INTEGER NOT NULL,
                experience TEXT NOT NULL DEFAULT '[]',
                education TEXT NOT NULL DEFAULT '[]',
                contact TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY,
                doctor_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                rating REAL NOT NULL CHECK (rating >= 1 AND rating <= 5),
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (author_id, doctor_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comment_votes (
                comment_id INTEGER NOT NULL,
                voter_id INTEGER NOT NULL,
                is_positive INTEGER NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (comment_id, voter_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_comments_doctor ON comments(doctor_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error("initialize schema"))?;
        }
        Ok(())
    }

    async fn exists(&self, sql: &'static str, id: RecordId) -> AppResult<bool> {
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("check existence"))?;
        Ok(row.is_some())
    }

    async fn votes_by_comment(&self, comment_ids: &[RecordId]) -> AppResult<HashMap<RecordId, Vec<Vote>>> {
        let mut grouped: HashMap<RecordId, Vec<Vote>> = HashMap::new();
        if comment_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT comment_id, voter_id, is_positive FROM comment_votes WHERE comment_id IN (",
        );
        let mut separated = qb.separated(",");
        for id in comment_ids {
            separated.push_bind(*id);
        }
        qb.push(") ORDER BY rowid");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load votes"))?;

        for row in rows {
            grouped
                .entry(row.get("comment_id"))
                .or_default()
                .push(vote_from_row(&row));
        }
        Ok(grouped)
    }
}

/// Keep client-fault classification from `sqlx::Error`, add context to the rest
fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| match AppError::from(e) {
        AppError::DatabaseError(msg) => AppError::DatabaseError(format!("Failed to {}: {}", action, msg)),
        other => other,
    }
}

fn vote_from_row(row: &SqliteRow) -> Vote {
    Vote {
        voter_id: row.get("voter_id"),
        is_positive: row.get("is_positive"),
    }
}

fn doctor_view_from_row(row: &SqliteRow) -> AppResult<DoctorView> {
    let doctor = Doctor {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        img: row.get("img"),
        about: row.get("about"),
        profession_id: row.get("profession_id"),
        hospital_id: row.get("hospital_id"),
        experience: serde_json::from_str(&row.get::<String, _>("experience"))?,
        education: serde_json::from_str(&row.get::<String, _>("education"))?,
        contact: serde_json::from_str(&row.get::<String, _>("contact"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    };
    let profession = Profession {
        id: doctor.profession_id,
        name: row.get("profession_name"),
    };
    let hospital = Hospital {
        id: doctor.hospital_id,
        name: row.get("hospital_name"),
        img: row.get("hospital_img"),
    };
    Ok(DoctorView::new(doctor, profession, hospital))
}

fn summary_from_row(row: &SqliteRow) -> RatingSummary {
    let total: Option<f64> = row.get("total");
    let count: i64 = row.get("count");
    RatingSummary::from_total(total.unwrap_or(0.0), count.max(0) as u64)
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("run health check"))?;
        Ok(())
    }

    async fn create_profession(&self, profession: &Profession) -> AppResult<()> {
        sqlx::query("INSERT INTO professions (id, name) VALUES (?, ?)")
            .bind(profession.id)
            .bind(&profession.name)
            .execute(&self.pool)
            .await
            .map_err(|e| match db_error("create profession")(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("Profession {:?} already exists", profession.name))
                }
                other => other,
            })?;
        Ok(())
    }

    async fn list_professions(&self) -> AppResult<Vec<Profession>> {
        let rows = sqlx::query("SELECT id, name FROM professions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list professions"))?;
        Ok(rows
            .into_iter()
            .map(|row| Profession {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn profession_exists(&self, id: RecordId) -> AppResult<bool> {
        self.exists("SELECT 1 FROM professions WHERE id = ?", id).await
    }

    async fn create_hospital(&self, hospital: &Hospital) -> AppResult<()> {
        sqlx::query("INSERT INTO hospitals (id, name, img) VALUES (?, ?, ?)")
            .bind(hospital.id)
            .bind(&hospital.name)
            .bind(&hospital.img)
            .execute(&self.pool)
            .await
            .map_err(|e| match db_error("create hospital")(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("Hospital {:?} already exists", hospital.name))
                }
                other => other,
            })?;
        Ok(())
    }

    async fn list_hospitals(&self) -> AppResult<Vec<Hospital>> {
        let rows = sqlx::query("SELECT id, name, img FROM hospitals ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list hospitals"))?;
        Ok(rows
            .into_iter()
            .map(|row| Hospital {
                id: row.get("id"),
                name: row.get("name"),
                img: row.get("img"),
            })
            .collect())
    }

    async fn hospital_exists(&self, id: RecordId) -> AppResult<bool> {
        self.exists("SELECT 1 FROM hospitals WHERE id = ?", id).await
    }

    async fn upsert_doctor(&self, doctor: &Doctor) -> AppResult<(Doctor, bool)> {
        let row = sqlx::query(
            r#"
            INSERT INTO doctors (id, user_id, title, first_name, last_name, img, about,
                                 profession_id, hospital_id, experience, education, contact,
                                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                title = excluded.title,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                about = excluded.about,
                profession_id = excluded.profession_id,
                hospital_id = excluded.hospital_id,
                experience = excluded.experience,
                education = excluded.education,
                contact = excluded.contact,
                updated_at = excluded.updated_at
            RETURNING id, img, created_at, updated_at
            "#,
        )
        .bind(doctor.id)
        .bind(doctor.user_id)
        .bind(&doctor.title)
        .bind(&doctor.first_name)
        .bind(&doctor.last_name)
        .bind(&doctor.img)
        .bind(&doctor.about)
        .bind(doctor.profession_id)
        .bind(doctor.hospital_id)
        .bind(serde_json::to_string(&doctor.experience)?)
        .bind(serde_json::to_string(&doctor.education)?)
        .bind(serde_json::to_string(&doctor.contact)?)
        .bind(doctor.created_at)
        .bind(doctor.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("upsert doctor"))?;

        let mut stored = doctor.clone();
        stored.id = row.get("id");
        stored.img = row.get("img");
        stored.created_at = row.get("created_at");
        stored.updated_at = row.get("updated_at");
        let created = stored.id == doctor.id;
        Ok((stored, created))
    }

    async fn doctor_exists(&self, id: RecordId) -> AppResult<bool> {
        self.exists("SELECT 1 FROM doctors WHERE id = ?", id).await
    }

    async fn ranking_candidates(&self) -> AppResult<Vec<DoctorView>> {
        let rows = sqlx::query(&format!("{} ORDER BY d.id", DOCTOR_VIEW_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load ranking candidates"))?;
        rows.iter().map(doctor_view_from_row).collect()
    }

    async fn doctor_view(&self, id: RecordId) -> AppResult<Option<DoctorView>> {
        let row = sqlx::query(&format!("{} WHERE d.id = ?", DOCTOR_VIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load doctor"))?;
        row.as_ref().map(doctor_view_from_row).transpose()
    }

    async fn doctor_view_by_user(&self, user_id: RecordId) -> AppResult<Option<DoctorView>> {
        let row = sqlx::query(&format!("{} WHERE d.user_id = ?", DOCTOR_VIEW_SELECT))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load doctor by user"))?;
        row.as_ref().map(doctor_view_from_row).transpose()
    }

    async fn doctor_ratings(&self) -> AppResult<Vec<(RecordId, RatingSummary)>> {
        let rows = sqlx::query(
            "SELECT doctor_id, SUM(rating) AS total, COUNT(*) AS count FROM comments GROUP BY doctor_id ORDER BY doctor_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("aggregate ratings"))?;

        Ok(rows
            .iter()
            .map(|row| (row.get("doctor_id"), summary_from_row(row)))
            .collect())
    }

    async fn doctor_rating(&self, doctor_id: RecordId) -> AppResult<Option<RatingSummary>> {
        let row = sqlx::query(
            "SELECT SUM(rating) AS total, COUNT(*) AS count FROM comments WHERE doctor_id = ?",
        )
        .bind(doctor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("aggregate doctor rating"))?;

        let summary = summary_from_row(&row);
        Ok((!summary.is_empty()).then_some(summary))
    }

    async fn upsert_comment(&self, comment: &Comment) -> AppResult<(Comment, bool)> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (id, doctor_id, author_id, rating, text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(author_id, doctor_id) DO UPDATE SET
                rating = excluded.rating,
                text = excluded.text,
                updated_at = excluded.updated_at
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.doctor_id)
        .bind(comment.author_id)
        .bind(comment.rating)
        .bind(&comment.text)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("upsert comment"))?;

        let id: RecordId = row.get("id");
        let votes = self.votes_for(id).await?;
        let stored = Comment {
            id,
            doctor_id: comment.doctor_id,
            author_id: comment.author_id,
            rating: comment.rating,
            text: comment.text.clone(),
            votes,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };
        Ok((stored, id == comment.id))
    }

    async fn list_comments(&self, doctor_id: RecordId, page: Page) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, doctor_id, author_id, rating, text, created_at, updated_at
            FROM comments
            WHERE doctor_id = ?
            ORDER BY created_at, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(doctor_id)
        .bind(page.limit as i64)
        .bind(page.skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list comments"))?;

        let ids: Vec<RecordId> = rows.iter().map(|row| row.get("id")).collect();
        let mut votes = self.votes_by_comment(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: RecordId = row.get("id");
                Comment {
                    id,
                    doctor_id: row.get("doctor_id"),
                    author_id: row.get("author_id"),
                    rating: row.get("rating"),
                    text: row.get("text"),
                    votes: votes.remove(&id).unwrap_or_default(),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }
            })
            .collect())
    }

    async fn comment_exists(&self, id: RecordId) -> AppResult<bool> {
        self.exists("SELECT 1 FROM comments WHERE id = ?", id).await
    }

    async fn apply_vote(
        &self,
        comment_id: RecordId,
        voter_id: RecordId,
        intent: VoteIntent,
    ) -> AppResult<VoteWrite> {
        let now = current_time_secs();
        let mut tx = self.pool.begin().await.map_err(db_error("begin vote transaction"))?;

        // The conditional write runs first so the transaction holds the write
        // lock before anything is read back.
        let written = match intent.target() {
            Some(is_positive) => sqlx::query(
                r#"
                INSERT INTO comment_votes (comment_id, voter_id, is_positive, revision, created_at)
                SELECT id, ?, ?, 0, ? FROM comments WHERE id = ?
                ON CONFLICT(comment_id, voter_id) DO UPDATE SET
                    is_positive = excluded.is_positive,
                    revision = comment_votes.revision + 1
                WHERE comment_votes.is_positive <> excluded.is_positive
                RETURNING revision
                "#,
            )
            .bind(voter_id)
            .bind(is_positive)
            .bind(now)
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("record vote"))?
            .map(|row| {
                // revision 0 is a fresh row, anything above is a flip
                if row.get::<i64, _>("revision") == 0 {
                    None
                } else {
                    Some(!is_positive)
                }
            }),
            None => sqlx::query(
                "DELETE FROM comment_votes WHERE comment_id = ? AND voter_id = ? RETURNING is_positive",
            )
            .bind(comment_id)
            .bind(voter_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("clear vote"))?
            .map(|row| Some(row.get::<bool, _>("is_positive"))),
        };

        let previous = match written {
            Some(previous) => {
                sqlx::query("UPDATE comments SET updated_at = ? WHERE id = ?")
                    .bind(now)
                    .bind(comment_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error("touch comment"))?;
                previous
            }
            None => {
                let exists = sqlx::query("SELECT 1 FROM comments WHERE id = ?")
                    .bind(comment_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_error("check comment"))?
                    .is_some();
                if !exists {
                    return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
                }
                // Nothing written: the voter already holds the target state
                intent.target()
            }
        };

        let vote_count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM comment_votes WHERE comment_id = ?")
            .bind(comment_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("count votes"))?
            .get("count");

        tx.commit().await.map_err(db_error("commit vote"))?;

        Ok(VoteWrite {
            previous,
            vote_count: vote_count.max(0) as u64,
        })
    }

    async fn votes_for(&self, comment_id: RecordId) -> AppResult<Vec<Vote>> {
        let rows = sqlx::query(
            "SELECT voter_id, is_positive FROM comment_votes WHERE comment_id = ? ORDER BY rowid",
        )
        .bind(comment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("load votes"))?;
        Ok(rows.iter().map(vote_from_row).collect())
    }
}
