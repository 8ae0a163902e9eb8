// src/handlers.rs

pub mod change_requests;
pub mod leads;
pub mod stages;
