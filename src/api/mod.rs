pub mod injuries_api;
pub mod schedule_api;
