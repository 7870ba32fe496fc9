//! Route handlers

pub mod classification;
pub mod items;
pub mod root;
