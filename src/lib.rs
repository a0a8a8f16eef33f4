//! Paperdesk Trading Library
//!
//! Core components for the paperdesk paper-trading platform: the trade
//! execution engine, portfolio valuation, and the persistence and HTTP
//! layers around them.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
