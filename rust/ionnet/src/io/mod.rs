pub mod feature_table;
pub mod modification_xml;
pub mod network_report;

pub use feature_table::{
    FeatureTable,
    read_feature_table,
};
pub use network_report::{
    MemberReport,
    NetworkReport,
    RelationReport,
    build_reports,
};
