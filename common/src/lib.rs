//! Receipt Scan Common Library
//!
//! CLIとセッションで共有される型とユーティリティ

pub mod types;
pub mod error;
pub mod mime;
pub mod prompts;
pub mod parser;
pub mod export;

pub use types::{EncodedPayload, ExtractionRequest, ReceiptData};
pub use error::{Error, Result};
pub use mime::{is_accepted, is_pdf, ACCEPTED_MIME_TYPES, PDF_MIME};
pub use prompts::{build_request, build_request_with, PROMPT_VERSION, RECEIPT_PROMPT};
pub use parser::{derive_description, extract_json_object, parse_receipt_response};
