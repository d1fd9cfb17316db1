use super::{parse_timestamp, StoreError};
use crate::domain::{User, UserDetails};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, instrument};

/// Persistent collection of [`User`] entities
///
/// Email addresses are unique, inserting or updating a user with an email that is already in
/// use results in [`StoreError::Conflict`].
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Creates a new store on top of the pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet
    pub async fn setup(&self) -> Result<(), StoreError> {
        sqlx::query(include_str!("sql/users.sql"))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All users in order of registration
    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query("SELECT Id, Name, Email, CreatedAt FROM Users ORDER BY CreatedAt, rowid")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    /// User with the given identifier
    pub async fn find(&self, id: &str) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT Id, Name, Email, CreatedAt FROM Users WHERE Id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        user_from_row(&row)
    }

    /// Stores a new user
    #[instrument(skip(self, user), fields(id = user.id.as_str()))]
    pub async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO Users ( Id, Name, Email, CreatedAt ) VALUES ( ?, ?, ?, ? )")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        debug!("Inserted user");
        Ok(())
    }

    /// Replaces the details of an existing user and returns its new state
    #[instrument(skip(self, details))]
    pub async fn update(&self, id: &str, details: &UserDetails) -> Result<User, StoreError> {
        let mut transaction = self.pool.begin().await?;

        let affected = sqlx::query("UPDATE Users SET Name = ?, Email = ? WHERE Id = ?")
            .bind(&details.name)
            .bind(&details.email)
            .bind(id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        let row = sqlx::query("SELECT Id, Name, Email, CreatedAt FROM Users WHERE Id = ?")
            .bind(id)
            .fetch_one(&mut *transaction)
            .await?;
        let user = user_from_row(&row)?;

        transaction.commit().await?;

        debug!("Updated user");
        Ok(user)
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let created_at: String = row.try_get("CreatedAt")?;

    Ok(User {
        id: row.try_get("Id")?,
        name: row.try_get("Name")?,
        email: row.try_get("Email")?,
        created_at: parse_timestamp(&created_at)?,
    })
}
