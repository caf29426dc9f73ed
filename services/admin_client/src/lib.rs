pub mod adapters;
pub mod config;
pub mod error;
pub mod review;
pub mod session;
pub mod web;
