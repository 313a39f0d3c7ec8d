#![allow(dead_code)]

use db_peeker::utils::datasource::SQLiteConnector;
use db_peeker::utils::{Config, DataSourceConfig};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// In-memory database: 30 customers, every third one without a city,
/// plus two views over them.
pub async fn seeded_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query("CREATE TABLE customers (id INTEGER, name TEXT, city TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    for i in 1..=30i64 {
        let city = if i % 3 == 0 {
            None
        } else if i % 2 == 0 {
            Some("Oslo")
        } else {
            Some("Bergen")
        };
        sqlx::query("INSERT INTO customers (id, name, city) VALUES (?1, ?2, ?3)")
            .bind(i)
            .bind(format!("Customer {}", i))
            .bind(city)
            .execute(&pool)
            .await
            .unwrap();
    }

    sqlx::query("CREATE VIEW V_Customers AS SELECT * FROM customers")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("CREATE VIEW \"V Oslo (EU)\" AS SELECT id, name FROM customers WHERE city = 'Oslo'")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

pub async fn seeded_connector() -> (SqlitePool, SQLiteConnector) {
    let pool = seeded_pool().await;
    (pool.clone(), SQLiteConnector::from_pool(pool))
}

pub fn test_config(pages_dir: &Path) -> Config {
    Config {
        datasource: DataSourceConfig::Sqlite {
            url: "sqlite::memory:".to_string(),
        },
        schema: None,
        pages_dir: pages_dir.to_path_buf(),
        server_address: "127.0.0.1:0".to_string(),
    }
}
