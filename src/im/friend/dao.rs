//! 好友数据访问层（DAO）
//!
//! 好友申请表与好友关系表的读写。写操作均为接收连接参数的静态方法，
//! 由服务层在同一个事务中组合调用。

use crate::im::error::Result;
use crate::im::friend::models::{canonical_pair, FriendRequest, RequestStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::debug;

const REQUEST_COLUMNS: &str =
    "request_id, sender_id, receiver_id, status, created_at, updated_at";

/// 好友 DAO（基于 sqlx）
pub struct FriendDao {
    db: Pool<Sqlite>,
}

impl FriendDao {
    /// 创建新的好友 DAO
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 收到的、仍待处理的好友申请
    pub async fn get_incoming_pending(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests \
             WHERE receiver_id = ? AND status = ? ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(RequestStatus::Pending)
            .fetch_all(&self.db)
            .await?;
        debug!("[FriendDAO] 用户 {} 待处理申请 {} 个", user_id, rows.len());
        rows.iter().map(Self::row_to_request).collect()
    }

    /// 发出的、仍待对方处理的好友申请
    pub async fn get_outgoing_pending(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests \
             WHERE sender_id = ? AND status = ? ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(RequestStatus::Pending)
            .fetch_all(&self.db)
            .await?;
        rows.iter().map(Self::row_to_request).collect()
    }

    /// 双方是否为好友
    pub async fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        Self::friendship_exists(&mut conn, a, b).await
    }

    pub(crate) async fn insert_request(
        conn: &mut SqliteConnection,
        request: &FriendRequest,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO friend_requests (
                request_id, sender_id, receiver_id, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.request_id)
        .bind(&request.sender_id)
        .bind(&request.receiver_id)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// 指定方向上最新的一条待处理申请
    pub(crate) async fn find_latest_pending(
        conn: &mut SqliteConnection,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Option<FriendRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests \
             WHERE sender_id = ? AND receiver_id = ? AND status = ? \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(sender_id)
            .bind(receiver_id)
            .bind(RequestStatus::Pending)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(Self::row_to_request).transpose()
    }

    pub(crate) async fn find_by_id(
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> Result<Option<FriendRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE request_id = ?");
        let row = sqlx::query(&sql)
            .bind(request_id)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(Self::row_to_request).transpose()
    }

    /// 将待处理申请推进到终态，返回是否真的发生了变更
    ///
    /// 条件更新保证并发处理同一申请时只有一方成功。
    pub(crate) async fn settle_request(
        conn: &mut SqliteConnection,
        request_id: &str,
        status: RequestStatus,
        now: i64,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE friend_requests SET status = ?, updated_at = ? WHERE request_id = ? AND status = ?",
        )
        .bind(status)
        .bind(now)
        .bind(request_id)
        .bind(RequestStatus::Pending)
        .execute(&mut *conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// 建立好友关系（一对用户一行，重复建立无副作用）
    pub(crate) async fn insert_friendship(
        conn: &mut SqliteConnection,
        a: &str,
        b: &str,
        now: i64,
    ) -> Result<()> {
        let (user_a, user_b) = canonical_pair(a, b);
        sqlx::query("INSERT OR IGNORE INTO friendships (user_a, user_b, created_at) VALUES (?, ?, ?)")
            .bind(user_a)
            .bind(user_b)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn friendship_exists(
        conn: &mut SqliteConnection,
        a: &str,
        b: &str,
    ) -> Result<bool> {
        let (user_a, user_b) = canonical_pair(a, b);
        let row = sqlx::query("SELECT 1 FROM friendships WHERE user_a = ? AND user_b = ?")
            .bind(user_a)
            .bind(user_b)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    fn row_to_request(row: &SqliteRow) -> Result<FriendRequest> {
        Ok(FriendRequest {
            request_id: row.try_get("request_id")?,
            sender_id: row.try_get("sender_id")?,
            receiver_id: row.try_get("receiver_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
