// src/handlers/mod.rs

pub mod ads;
pub mod comments;
pub mod favorites;
