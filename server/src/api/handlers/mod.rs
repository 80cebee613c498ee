//! API request handlers

pub mod editor;
pub mod health;
pub mod run;
pub mod session;
