pub mod report;

pub use report::{build_report, Report};
