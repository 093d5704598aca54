// src/domain/services/mod.rs
pub mod reconciliation_service;
