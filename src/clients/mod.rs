pub mod document_client;

pub use document_client::{read_upload_file, DocumentBackend, DocumentClient};
