// src/lib.rs

//! Procurement announcement crawler library

pub mod document;
pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
