//! Middleware-specific tests for FluentRouter
//!
//! Tests are organized by middleware in separate modules.
//! The `interactions` module checks the order of the assembled stack.

mod catch_panic;
mod config;
mod cors;
mod interactions;
mod rate_limiting;
mod request_context;
mod timeout;
