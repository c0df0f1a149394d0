pub mod audio;
pub mod hub;
pub mod llm;
pub mod observability;
pub mod storage;
