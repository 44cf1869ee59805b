pub mod app;
pub mod browser;
pub mod menu;
pub mod output;
pub mod prompt;
pub mod root;
