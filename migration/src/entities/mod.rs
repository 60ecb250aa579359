pub mod analytics_log;
