//! # 智能家居存储模块
//!
//! 本模块提供统一的数据存储抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 该模块采用分层架构，遵循以下原则：
//!
//! 1. **接口抽象层** (`traits.rs`)：定义所有资源存储的异步 Trait 接口
//! 2. **数据模型层** (`models.rs`)：定义存储相关的数据结构
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和演示）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用）
//!    - `redis.rs`：基础传感器最近值缓存
//!
//! ## 模块说明
//!
//! - [`models`]：数据模型定义（智能设备、状态历史、设备日志、传感器数据、
//!   基础传感器）
//! - [`traits`]：存储接口定义（设备 CRUD、历史/日志/传感器追加与查询）
//! - [`error`]：存储错误类型定义
//! - [`connection`]：PostgreSQL 连接池管理（最大连接数 8）
//!
//! ## 存储实现
//!
//! - [`in_memory`]：使用 `RwLock<HashMap>` / `RwLock<Vec>` 提供线程安全的
//!   内存存储，适用于单元测试和集成测试
//! - [`postgres`]：使用 sqlx 提供参数化 SQL 访问，设备状态与稀疏传感器字段
//!   以 JSON 文本列存储
//! - [`redis`]：基础传感器最近值缓存，键格式 `device:{id}:current_value`，
//!   默认 TTL 3600 秒
//!
//! ## 设计约束
//!
//! - **禁止直接 SQL**：上层禁止直接写 SQL，统一通过 storage 层
//! - **追加型审计**：历史/日志/传感器写入为追加操作，彼此独立、非事务
//! - **参数化查询**：所有 SQL 使用参数绑定，防止 SQL 注入

// 模块导出：将子模块的内容导出到 crate 根目录
pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod redis;
pub mod traits;

// 导出常用类型到 crate 根目录，方便外部引用
pub use connection::*;
pub use error::*;
pub use models::*;
pub use redis::RedisCurrentValueStore;
pub use traits::*;

// 导出内存存储实现类型
pub use in_memory::{
    InMemoryBaseDeviceStore, InMemoryBaseSensorDataStore, InMemoryCurrentValueStore,
    InMemoryDeviceLogStore, InMemorySensorDataStore, InMemorySmartDeviceStore,
    InMemoryStateHistoryStore,
};

// 导出 PostgreSQL 存储实现类型
pub use postgres::{
    PgBaseDeviceStore, PgBaseSensorDataStore, PgDeviceLogStore, PgSensorDataStore,
    PgSmartDeviceStore, PgStateHistoryStore,
};
