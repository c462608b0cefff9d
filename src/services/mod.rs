pub mod analyzer;
pub mod llm_service;
pub mod normalizer;
pub mod ollama_service;
pub mod synthesizer;

pub use analyzer::{AnalyzerConfig, ContentAnalysis, ContentAnalyzer};
pub use llm_service::LlmService;
pub use normalizer::TextNormalizer;
pub use ollama_service::OllamaService;
pub use synthesizer::QuestionSynthesizer;
