// src/utils/mod.rs

pub mod humanize;
pub mod jwt;
