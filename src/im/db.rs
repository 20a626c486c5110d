//! SQLite 数据库工具：统一创建连接池并执行 sqlx 迁移
//!
//! 约定：本 crate 根目录下存在 `migrations/` 目录，存放所有迁移 SQL 文件。
//! 通过 `sqlx::migrate!()` 自动管理 schema 升级。
//! 连接池由入口显式创建、显式关闭，各个 DAO / 服务只持有克隆出来的句柄。

use crate::im::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// 写锁等待上限，超时后事务以 StoreTransactionFailed 失败
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// 创建 SQLite 连接池并执行所有未执行的迁移
///
/// 内存数据库（`sqlite::memory:`）每个连接都是独立的库，
/// 调用方应传入 `max_connections = 1`，这里也会保证该连接不会被回收。
pub async fn create_sqlite_pool_with_migration(
    db_url: &str,
    max_connections: u32,
) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    // 从 `migrations/` 目录读取迁移并执行
    sqlx::migrate!().run(&pool).await?;

    info!(
        "[DB] 数据库已就绪: {}, 最大连接数: {}",
        db_url, max_connections
    );
    Ok(pool)
}

/// 开启写事务（`BEGIN IMMEDIATE`）
///
/// 事务开始时即取得写锁，拿不到时在 busy_timeout 内等待；
/// 默认的延迟事务先读后写，升级写锁失败会直接返回 `database is locked`。
pub(crate) async fn begin_write(pool: &Pool<Sqlite>) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// 关闭连接池，等待所有连接归还
pub async fn close(pool: &Pool<Sqlite>) {
    pool.close().await;
    info!("[DB] 数据库连接池已关闭");
}


#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let pool = test_support::memory_pool().await;
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' AND name NOT LIKE 'sqlite%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();
        assert_eq!(
            names,
            vec![
                "conversations",
                "friend_requests",
                "friendships",
                "messages",
                "users"
            ]
        );
        close(&pool).await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn write_transactions_queue_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_support::file_pool(&dir, 4).await;

        let mut first = begin_write(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (id, email, created_at) VALUES ('u1', 'a@x.com', 0)")
            .execute(&mut *first)
            .await
            .unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut tx = begin_write(&pool).await?;
                let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
                    .fetch_one(&mut *tx)
                    .await?;
                tx.commit().await?;
                Ok::<i64, crate::im::error::ChatError>(row.get("n"))
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        first.commit().await.unwrap();

        // 第二个写事务等到第一个提交后才开始，因此能看到它的写入
        assert_eq!(waiter.await.unwrap().unwrap(), 1);
        close(&pool).await;
    }
}
