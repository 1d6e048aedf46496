use chrono::{DateTime, Utc};
use sqlx::Row;

use medbook_core::domain::customer::{Customer, CustomerId, NewCustomer};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn customer_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    Ok(Customer {
        id: CustomerId(row.try_get("customer_id").map_err(RepositoryError::Database)?),
        name: row.try_get("name").map_err(RepositoryError::Database)?,
        email: row.try_get("email").map_err(RepositoryError::Database)?,
        phone: row.try_get("phone").map_err(RepositoryError::Database)?,
        created_at: row
            .try_get::<Option<DateTime<Utc>>, _>("created_at")
            .map_err(RepositoryError::Database)?,
    })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT customer_id, name, email, phone, created_at FROM customers WHERE email = ?",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(customer_from_row).transpose()
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO customers (name, email, phone) VALUES (?, ?, ?) \
             RETURNING customer_id, name, email, phone, created_at",
        )
        .bind(&customer.name)
        .bind(customer.email.to_lowercase())
        .bind(&customer.phone)
        .fetch_one(&self.pool)
        .await?;

        customer_from_row(&row)
    }

    async fn update_contact(
        &self,
        id: CustomerId,
        name: &str,
        phone: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE customers SET name = ?, phone = ? WHERE customer_id = ?")
            .bind(name)
            .bind(phone)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
