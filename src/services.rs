pub mod board;
pub mod change_request_service;
pub mod pipeline_service;
pub mod transition_rules;
pub mod visibility;
