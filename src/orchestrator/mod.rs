//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量执行编辑计划，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量计划处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载计划（Vec<EditPlan>）
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `plan_processor` - 单个计划处理器
//! - 打开文档会话
//! - 逐项执行计划中的操作
//! - 保存并标记计划文件
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<EditPlan>)
//!     ↓
//! plan_processor (处理 Vec<PlanOperation>)
//!     ↓
//! workflow::DocumentSession (保存 / 插入 / 退出)
//!     ↓
//! organizer::PageOrganizer (页面状态机)     clients::DocumentClient (文档服务)
//! ```

pub mod batch_processor;
pub mod plan_processor;

pub use batch_processor::App;
pub use plan_processor::{apply_operation, process_plan, PlanStats};
