/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的文档数量
    pub max_concurrent_documents: usize,
    /// 生成请求（TOML）存放目录
    pub request_folder: String,
    /// 生成结果（JSON）输出目录
    pub output_folder: String,
    /// 未指定时的默认题目数量
    pub default_question_count: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- Ollama 配置 ---
    pub ollama_enabled: bool,
    pub ollama_api_base_url: String,
    pub ollama_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 8,
            request_folder: "quiz_requests".to_string(),
            output_folder: "quiz_output".to_string(),
            default_question_count: 10,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-3.5-turbo".to_string(),
            ollama_enabled: true,
            ollama_api_base_url: "http://localhost:11434".to_string(),
            ollama_model_name: "llama2".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_documents: std::env::var("MAX_CONCURRENT_DOCUMENTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_documents),
            request_folder: std::env::var("REQUEST_FOLDER").unwrap_or(default.request_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            default_question_count: std::env::var("DEFAULT_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_question_count),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            ollama_enabled: std::env::var("OLLAMA_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(default.ollama_enabled),
            ollama_api_base_url: std::env::var("OLLAMA_API_BASE_URL").unwrap_or(default.ollama_api_base_url),
            ollama_model_name: std::env::var("OLLAMA_MODEL_NAME").unwrap_or(default.ollama_model_name),
        }
    }

    /// LLM 后端是否可用（API Key 已配置且不是占位符）
    pub fn llm_available(&self) -> bool {
        !self.llm_api_key.is_empty() && self.llm_api_key != "your_openai_api_key_here"
    }
}
