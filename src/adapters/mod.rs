pub mod api_handler;
pub mod form_handler;
pub mod health_handler;
pub mod hubspot_client;
pub mod submission_log;
