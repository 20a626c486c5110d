//! 用户数据访问层（DAO）
//!
//! 负责用户记录的读写，以及好友列表、申请列表视图的组装。
//! 以 `find_*` 命名的静态方法接收连接参数，供服务层在事务内复用。

use crate::im::error::{ChatError, Result};
use crate::im::friend::models::RequestStatus;
use crate::im::serialization::{generate_id, now_millis};
use crate::im::user::models::User;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{debug, info, warn};

/// 用户 DAO（基于 sqlx）
pub struct UserDao {
    db: Pool<Sqlite>,
}

impl UserDao {
    /// 创建新的用户 DAO
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 按邮箱查询用户
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.db.acquire().await?;
        Self::find_by_email(&mut conn, email.trim()).await
    }

    /// 按 userID 查询用户
    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let mut conn = self.db.acquire().await?;
        Self::find_by_id(&mut conn, user_id).await
    }

    /// 注册新用户，邮箱重复时返回 DuplicateEmail
    pub async fn create(&self, email: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ChatError::InvalidInput("邮箱不能为空".to_string()));
        }

        let user = User {
            id: generate_id(),
            email: email.to_string(),
            created_at: now_millis(),
            friends: Vec::new(),
            outgoing_requests: Vec::new(),
            incoming_requests: Vec::new(),
        };

        // 先插入再识别唯一约束冲突，并发注册同一邮箱时也只会成功一次
        let res = sqlx::query("INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(user.created_at)
            .execute(&self.db)
            .await;

        match res {
            Ok(_) => {
                info!("[UserDAO] 新用户注册: {} ({})", user.email, user.id);
                Ok(user)
            }
            Err(e) if ChatError::is_unique_violation(&e) => {
                warn!("[UserDAO] 邮箱已被注册: {}", email);
                Err(ChatError::DuplicateEmail(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 判断用户是否存在
    pub(crate) async fn exists(conn: &mut SqliteConnection, user_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    pub(crate) async fn find_by_id(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Some(
                Self::load_relations(
                    conn,
                    row.try_get("id")?,
                    row.try_get("email")?,
                    row.try_get("created_at")?,
                )
                .await?,
            )),
            None => Ok(None),
        }
    }

    pub(crate) async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Some(
                Self::load_relations(
                    conn,
                    row.try_get("id")?,
                    row.try_get("email")?,
                    row.try_get("created_at")?,
                )
                .await?,
            )),
            None => Ok(None),
        }
    }

    /// 好友 userID 列表（好友关系一对用户只存一行，两个方向都要查）
    pub(crate) async fn find_friend_ids(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT friend_id FROM (
                SELECT user_b AS friend_id, created_at FROM friendships WHERE user_a = ?
                UNION ALL
                SELECT user_a AS friend_id, created_at FROM friendships WHERE user_b = ?
            )
            ORDER BY created_at, friend_id
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("friend_id").map_err(ChatError::from))
            .collect()
    }

    async fn load_relations(
        conn: &mut SqliteConnection,
        id: String,
        email: String,
        created_at: i64,
    ) -> Result<User> {
        let friends = Self::find_friend_ids(conn, &id).await?;

        let outgoing = sqlx::query(
            r#"
            SELECT request_id FROM friend_requests
            WHERE sender_id = ? AND status != ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(&id)
        .bind(RequestStatus::Rejected)
        .fetch_all(&mut *conn)
        .await?;

        let incoming = sqlx::query(
            r#"
            SELECT request_id FROM friend_requests
            WHERE receiver_id = ? AND status != ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(&id)
        .bind(RequestStatus::Rejected)
        .fetch_all(&mut *conn)
        .await?;

        let outgoing_requests = outgoing
            .iter()
            .map(|r| r.try_get::<String, _>("request_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let incoming_requests = incoming
            .iter()
            .map(|r| r.try_get::<String, _>("request_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            "[UserDAO] 加载用户 {}: 好友 {} 个, 发出申请 {} 个, 收到申请 {} 个",
            id,
            friends.len(),
            outgoing_requests.len(),
            incoming_requests.len()
        );

        Ok(User {
            id,
            email,
            created_at,
            friends,
            outgoing_requests,
            incoming_requests,
        })
    }
}
