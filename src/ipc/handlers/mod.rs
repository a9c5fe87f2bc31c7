pub mod core;
pub mod courses;
pub mod dashboard;
pub mod library;
pub mod pages;
pub mod queries;
pub mod settings;
