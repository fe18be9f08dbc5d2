use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 文档服务地址（包含 `/api` 前缀）
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 撤销栈上限，0 表示不限制
    pub history_limit: usize,
    /// 编辑计划（TOML）存放目录
    pub plan_folder: String,
    /// 同时处理的计划数量
    pub max_concurrent_plans: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8001/api".to_string(),
            request_timeout_secs: 60,
            history_limit: 0,
            plan_folder: "plans".to_string(),
            max_concurrent_plans: 4,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取配置，解析失败的值回退到默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            api_base_url: lookup("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.api_base_url),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            history_limit: lookup("HISTORY_LIMIT").and_then(|v| v.parse().ok()).unwrap_or(default.history_limit),
            plan_folder: lookup("PLAN_FOLDER").unwrap_or(default.plan_folder),
            max_concurrent_plans: lookup("MAX_CONCURRENT_PLANS").and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_plans),
            verbose_logging: lookup("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                var_name: "API_BASE_URL".to_string(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var_name: "API_BASE_URL".to_string(),
                value: self.api_base_url.clone(),
                expected: "http(s) 地址".to_string(),
            });
        }
        if self.max_concurrent_plans == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_CONCURRENT_PLANS".to_string(),
                value: "0".to_string(),
                expected: "大于 0 的整数".to_string(),
            });
        }
        Ok(())
    }
}
