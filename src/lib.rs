//! SmartClip - clipboard history with alt-tab style cycling
//!
//! This library exports the core modules for testing and potential reuse.

pub mod app;
pub mod clipboard;
pub mod cycle;
pub mod error;
pub mod event;
pub mod hotkey;
pub mod logging;
pub mod models;
pub mod service;
pub mod storage;
pub mod ui;
