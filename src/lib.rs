//! Podium - content and constituency back office for a public office website
//!
//! Public read API for news, speeches, reports and media, a contact form,
//! and an authenticated admin API with role-gated editing, scheduling,
//! social posting, SEO metadata and backups.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
