pub mod audio;
pub mod bot;
pub mod config;
