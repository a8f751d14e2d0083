//! # User & Store Repository
//!
//! Owner onboarding: create a store, create the users attached to it.
//! The sale engine reads `first_name` from here when it snapshots a
//! cashier name onto a sale.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::{Store, User};

/// Input for creating a store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub industry: String,
    pub location: String,
    pub district: String,
    pub country: String,
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub id_number: String,
    pub phone: String,
    #[serde(default)]
    pub is_owner: bool,
    pub store_id: Option<String>,
}

/// Repository for user and store operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a store.
    pub async fn create_store(&self, new: NewStore) -> DbResult<Store> {
        let store = Store {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            industry: new.industry,
            location: new.location,
            district: new.district,
            country: new.country,
            created_at: Utc::now(),
        };

        debug!(id = %store.id, name = %store.name, "Inserting store");

        sqlx::query(
            r#"
            INSERT INTO stores (id, name, industry, location, district, country, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(&store.industry)
        .bind(&store.location)
        .bind(&store.district)
        .bind(&store.country)
        .bind(store.created_at)
        .execute(&self.pool)
        .await?;

        Ok(store)
    }

    /// Creates a user. A duplicate id number is refused before the insert
    /// so the caller gets a categorized error instead of a raw constraint
    /// failure.
    pub async fn create_user(&self, new: NewUser) -> DbResult<User> {
        if self.get_by_id_number(&new.id_number).await?.is_some() {
            return Err(DbError::duplicate("id_number", &new.id_number));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            id_number: new.id_number,
            phone: new.phone,
            is_owner: new.is_owner,
            store_id: new.store_id,
            created_at: Utc::now(),
        };

        debug!(id = %user.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, first_name, last_name, email, id_number,
                phone, is_owner, store_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.id_number)
        .bind(&user.phone)
        .bind(user.is_owner)
        .bind(&user.store_id)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by national id number (duplicate check on onboarding).
    pub async fn get_by_id_number(&self, id_number: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id_number = ?1")
            .bind(id_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn owner(store_id: Option<String>) -> NewUser {
        NewUser {
            first_name: "Thandi".to_string(),
            last_name: "N.".to_string(),
            email: "thandi@example.com".to_string(),
            id_number: "9001015800089".to_string(),
            phone: "+27 83 000 0000".to_string(),
            is_owner: true,
            store_id,
        }
    }

    #[tokio::test]
    async fn onboarding_creates_store_then_owner() {
        let db = test_db().await;
        let users = db.users();

        let store = users
            .create_store(NewStore {
                name: "Corner Shop".to_string(),
                industry: "Retail".to_string(),
                location: "12 Main St".to_string(),
                district: "Central".to_string(),
                country: "ZA".to_string(),
            })
            .await
            .unwrap();

        let user = users.create_user(owner(Some(store.id.clone()))).await.unwrap();
        assert!(user.is_owner);

        let loaded = users.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(loaded.store_id.as_deref(), Some(store.id.as_str()));
    }

    #[tokio::test]
    async fn duplicate_id_number_is_refused() {
        let db = test_db().await;
        let users = db.users();

        users.create_user(owner(None)).await.unwrap();
        let err = users.create_user(owner(None)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
