pub mod capture;

pub use capture::CaptureAnalytics;
