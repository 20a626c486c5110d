use chrono::Utc;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// 生成记录 ID（用户、好友申请、消息共用）
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// 当前时间（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 反序列化字符串字段并去掉首尾空白，null 视为空串
pub(crate) fn deserialize_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.map(|s| s.trim().to_string()).unwrap_or_default())
}
