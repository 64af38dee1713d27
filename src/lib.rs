pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod graphql;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
