//! Shared layer: models common to every feature slice

pub mod models;
