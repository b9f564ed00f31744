// src/lib.rs

pub mod config;
pub mod constants;
pub mod database;
pub mod dates;
pub mod editor;
pub mod error;
pub mod intake;
pub mod models;
pub mod presets;
pub mod query;
pub mod repository;
pub mod reschedule;
pub mod store;
pub mod view;
