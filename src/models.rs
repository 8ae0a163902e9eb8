pub mod auth;
pub mod board;
pub mod change_request;
pub mod lead;
pub mod stage;
