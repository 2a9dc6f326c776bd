//! Byline - a small blogging platform
//!
//! This library provides the core functionality for the Byline blog system.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod templates;
pub mod web;
