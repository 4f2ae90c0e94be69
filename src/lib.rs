pub mod app;
pub mod catalog;
pub mod config;
pub mod subject;
pub mod tmdb;
