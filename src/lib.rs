//! レシート画像/PDFをAIで読み取り、金額・日付・店名・品目を取り出す

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod model;
pub mod scanner;
pub mod session;
