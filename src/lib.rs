//! Library exports for the ads gateway
//!
//! This module exposes internal components for testing and potential library usage.

pub mod ads;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod oauth;
pub mod reporting;
pub mod route;
pub mod state;
