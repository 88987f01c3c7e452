pub mod document_loader;

pub use document_loader::{load_all_documents, load_document, parse_document, DocumentFormat};
