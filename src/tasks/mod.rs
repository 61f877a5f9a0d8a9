pub mod keep_alive;
pub mod morning_jobs;
pub mod scheduler;
pub mod task_runner;
