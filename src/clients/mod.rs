pub mod caldav_client;
pub mod dav_xml;
pub mod openai_client;
pub mod weather_client;
