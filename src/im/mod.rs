pub mod client;
pub mod conversation;
pub mod db;
pub mod error;
pub mod friend;
pub mod message;
pub mod serialization;
pub mod types;
pub mod user;

// 重新导出错误类型
pub use error::{ChatError, Result};
