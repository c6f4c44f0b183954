//! Lumina library
//!
//! Task lifecycle, recurrence, gamification, smart input, notes and
//! workouts over a local key-value store. The `lumina` binary is a thin
//! CLI over the `commands` layer.

pub mod app;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod services;
