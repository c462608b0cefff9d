pub mod batch_processor;
pub mod document_processor;

pub use batch_processor::App;
pub use document_processor::process_document;
