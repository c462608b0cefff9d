pub mod difficulty;
pub mod loaders;
pub mod quiz;

pub use difficulty::Difficulty;
pub use loaders::{load_all_toml_files, load_toml_to_request};
pub use quiz::{GenerationRequest, Provenance, Question, QuestionKind, Quiz};
