pub mod agenda;
pub mod ical;
pub mod session;
pub mod weather;
