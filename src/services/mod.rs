pub mod catalog;
pub mod fetcher;
pub mod inspect;
pub mod object;
pub mod orchestrator;
pub mod storage;
pub mod uploader;
