//! tudata - fetch and cache TuShare market data
//!
//! This module exposes the library surface used by the binary and by
//! integration tests: the provider client, the file cache, and the dataset
//! access layers for futures, index, margin, and fund tables.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod pro;
pub mod table;
