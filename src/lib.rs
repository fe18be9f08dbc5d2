//! # Page Organizer
//!
//! 一个用于整理 PDF 页面（重排、复制、旋转、删除、插入、撤销/重做）的 Rust 库和命令行工具
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 核心层（Organizer）
//! - `organizer/` - 纯内存的页面状态机，不做任何 I/O
//! - `PageOrganizer` - 页面列表 + 撤销/重做历史 + 保存配方
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 文档服务 HTTP 接口
//! - `DocumentBackend` - 会话层依赖的后端能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一个打开文档的完整编辑流程
//! - `DocumentSession` - 单一保存请求、插入上传、退出确认、缩略图
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量执行编辑计划，管理并发
//! - `orchestrator/plan_processor` - 把单个编辑计划应用到一个文档
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod organizer;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{DocumentBackend, DocumentClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{EditPlan, Page, PageUid, RecipeEntry, Rotation, ViewerType};
pub use orchestrator::{process_plan, App};
pub use organizer::{EditOutcome, OrganizeError, PageOrganizer, PageSelection};
pub use workflow::{DocumentSession, ExitDecision, SessionError};
