mod report;

pub use report::{
    InMemoryReporter, JsonlReporter, ReportCollector, ReportConfig, Reporter,
    SummaryTableReporter,
};
