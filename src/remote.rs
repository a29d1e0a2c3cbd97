use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::Date;

use crate::session::Role;

/// One row of the remote `user_roles` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RoleRecord {
    pub user_email: String,
    pub role: String,
    pub name: Option<String>,
}

/// One row of the remote `user_meals` table: the order one account placed
/// for one date. Absence of a row means "no order" for that (email, date).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MealRow {
    pub user_email: String,
    pub meal_date: Date,
    pub veg_quantity: i32,
    pub meat_quantity: i32,
}

/// Operations this crate consumes from the hosted store. Meal writes are
/// last-write-wins on the compound unique key (user_email, meal_date).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select_role_by_email(&self, email: &str) -> anyhow::Result<Option<RoleRecord>>;
    async fn insert_role(&self, email: &str, role: Role, name: &str) -> anyhow::Result<()>;
    async fn update_role_name(&self, email: &str, name: &str) -> anyhow::Result<()>;
    async fn update_role(&self, email: &str, role: Role) -> anyhow::Result<()>;
    async fn select_roles(&self) -> anyhow::Result<Vec<RoleRecord>>;

    async fn select_meals_by_email(&self, email: &str) -> anyhow::Result<Vec<MealRow>>;
    async fn select_all_meals(&self) -> anyhow::Result<Vec<MealRow>>;
    async fn select_meals_by_date(&self, date: Date) -> anyhow::Result<Vec<MealRow>>;
    async fn upsert_meals(&self, rows: &[MealRow]) -> anyhow::Result<()>;
    async fn delete_meals(&self, email: &str, dates: &[Date]) -> anyhow::Result<()>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgRemoteStore {
    db: PgPool,
}

impl PgRemoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn select_role_by_email(&self, email: &str) -> anyhow::Result<Option<RoleRecord>> {
        let record = sqlx::query_as::<_, RoleRecord>(
            r#"
            SELECT user_email, role, name
            FROM user_roles
            WHERE user_email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("select role by email")?;
        Ok(record)
    }

    async fn insert_role(&self, email: &str, role: Role, name: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_email, role, name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(email)
        .bind(role.as_str())
        .bind(name)
        .execute(&self.db)
        .await
        .context("insert role")?;
        Ok(())
    }

    async fn update_role_name(&self, email: &str, name: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE user_roles SET name = $2 WHERE user_email = $1
            "#,
        )
        .bind(email)
        .bind(name)
        .execute(&self.db)
        .await
        .context("update role name")?;
        Ok(())
    }

    async fn update_role(&self, email: &str, role: Role) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE user_roles SET role = $2 WHERE user_email = $1
            "#,
        )
        .bind(email)
        .bind(role.as_str())
        .execute(&self.db)
        .await
        .context("update role")?;
        Ok(())
    }

    async fn select_roles(&self) -> anyhow::Result<Vec<RoleRecord>> {
        let records = sqlx::query_as::<_, RoleRecord>(
            r#"
            SELECT user_email, role, name
            FROM user_roles
            ORDER BY user_email
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("select roles")?;
        Ok(records)
    }

    async fn select_meals_by_email(&self, email: &str) -> anyhow::Result<Vec<MealRow>> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT user_email, meal_date, veg_quantity, meat_quantity
            FROM user_meals
            WHERE user_email = $1
            "#,
        )
        .bind(email)
        .fetch_all(&self.db)
        .await
        .context("select meals by email")?;
        Ok(rows)
    }

    async fn select_all_meals(&self) -> anyhow::Result<Vec<MealRow>> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT user_email, meal_date, veg_quantity, meat_quantity
            FROM user_meals
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("select all meals")?;
        Ok(rows)
    }

    async fn select_meals_by_date(&self, date: Date) -> anyhow::Result<Vec<MealRow>> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT user_email, meal_date, veg_quantity, meat_quantity
            FROM user_meals
            WHERE meal_date = $1
            "#,
        )
        .bind(date)
        .fetch_all(&self.db)
        .await
        .context("select meals by date")?;
        Ok(rows)
    }

    async fn upsert_meals(&self, rows: &[MealRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let emails: Vec<&str> = rows.iter().map(|r| r.user_email.as_str()).collect();
        let dates: Vec<Date> = rows.iter().map(|r| r.meal_date).collect();
        let veg: Vec<i32> = rows.iter().map(|r| r.veg_quantity).collect();
        let meat: Vec<i32> = rows.iter().map(|r| r.meat_quantity).collect();

        sqlx::query(
            r#"
            INSERT INTO user_meals (user_email, meal_date, veg_quantity, meat_quantity)
            SELECT * FROM UNNEST($1::text[], $2::date[], $3::int4[], $4::int4[])
            ON CONFLICT (user_email, meal_date)
            DO UPDATE SET veg_quantity = EXCLUDED.veg_quantity,
                          meat_quantity = EXCLUDED.meat_quantity
            "#,
        )
        .bind(emails)
        .bind(dates)
        .bind(veg)
        .bind(meat)
        .execute(&self.db)
        .await
        .context("upsert meals")?;
        Ok(())
    }

    async fn delete_meals(&self, email: &str, dates: &[Date]) -> anyhow::Result<()> {
        if dates.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            DELETE FROM user_meals
            WHERE user_email = $1 AND meal_date = ANY($2)
            "#,
        )
        .bind(email)
        .bind(dates.to_vec())
        .execute(&self.db)
        .await
        .context("delete meals")?;
        Ok(())
    }
}
