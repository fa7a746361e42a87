//! Lifedesk library
//!
//! Headless engine for a personal productivity dashboard: habits with
//! daily check-ins and streaks, reminder scheduling, assistant command
//! processing, and CRUD for tasks, goals, notes, reading list, shopping
//! and events.

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod functions;
pub mod services;
