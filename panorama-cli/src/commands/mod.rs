pub mod config;
pub mod menu;
pub mod plugins;
pub mod serve;
