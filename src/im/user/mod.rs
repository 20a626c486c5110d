//! 用户模块
//!
//! 用户记录以及由好友关系、好友申请派生出的列表视图

pub mod dao;
pub mod models;

pub use dao::UserDao;
pub use models::User;
