pub mod chart;
pub mod clean;
pub mod html;
pub mod performance_row;
pub mod ranking;
pub mod report_error;
pub mod results_csv;
