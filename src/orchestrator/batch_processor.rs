//! 批量计划处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量编辑计划的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、初始化日志文件、创建文档服务客户端
//! 2. **批量加载**：扫描并加载所有待执行的计划（`Vec<EditPlan>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **全局统计**：汇总所有计划的处理结果

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::clients::DocumentClient;
use crate::config::Config;
use crate::models::plan::EditPlan;
use crate::orchestrator::plan_processor;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_plans_loaded, log_startup,
    print_final_stats,
};

/// 应用主结构
pub struct App {
    config: Config,
    client: DocumentClient,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config.api_base_url, config.max_concurrent_plans);

        let client = DocumentClient::new(&config)?;

        Ok(Self { config, client })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let all_plans = self.load_plans().await?;

        if all_plans.is_empty() {
            warn!("⚠️ 没有找到待执行的TOML计划，程序结束");
            return Ok(());
        }

        log_plans_loaded(all_plans.len(), self.config.max_concurrent_plans);

        let stats = self.process_all_plans(all_plans).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        Ok(())
    }

    /// 加载计划
    async fn load_plans(&self) -> Result<Vec<EditPlan>> {
        tracing::info!("\n📁 正在扫描待执行的计划: {}", self.config.plan_folder);
        crate::models::load_all_plan_files(&self.config.plan_folder).await
    }

    /// 处理所有计划
    async fn process_all_plans(&self, all_plans: Vec<EditPlan>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_plans;
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_plans = all_plans.len();
        let total_batches = total_plans.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total: total_plans,
            ..Default::default()
        };

        for (batch_idx, batch) in all_plans.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;

            log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total_plans,
            );

            let batch_result = self
                .process_batch(batch, batch_start, Arc::clone(&semaphore))
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            log_batch_complete(
                batch_idx + 1,
                batch_result.success,
                batch_result.success + batch_result.failed,
            );
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_plans: &[EditPlan],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut handles = Vec::with_capacity(batch_plans.len());

        for (idx, plan) in batch_plans.iter().enumerate() {
            let plan_index = batch_start + idx + 1;
            let permit = Arc::clone(&semaphore).acquire_owned().await?;

            // reqwest::Client 内部使用 Arc，clone 成本很低
            let client = self.client.clone();
            let plan = plan.clone();
            let config = self.config.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                plan_processor::process_plan(&client, plan, plan_index, &config).await
            });
            handles.push(handle);
        }

        let mut result = BatchResult::default();
        for (offset, outcome) in join_all(handles).await.into_iter().enumerate() {
            let plan_index = batch_start + offset + 1;
            match outcome {
                Ok(Ok(_)) => result.success += 1,
                Ok(Err(e)) => {
                    error!("[计划 {}] ❌ 处理过程中发生错误: {:#}", plan_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[计划 {}] 任务执行失败: {}", plan_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}
