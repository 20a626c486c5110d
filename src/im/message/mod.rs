//! 消息模块
//!
//! 单聊消息的持久化与已读状态

pub mod dao;
pub mod models;

// 重新导出主要类型和函数
pub use dao::MessageDao;
pub use models::{Message, MessageStatus};
