pub mod agenda_service;
pub mod assistant;
pub mod briefing_service;
pub mod greeting_service;
pub mod openai_service;
pub mod recurrence;
pub mod session_store;
pub mod weather_service;
