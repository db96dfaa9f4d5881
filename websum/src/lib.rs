// Library interface for websum modules
// This allows tests and the binary to import modules

pub mod llm;
pub mod output;
pub mod scraping;
pub mod summary;
