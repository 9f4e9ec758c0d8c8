//! Shared data model for the test case agent
//!
//! Used by the API server to shape model output and by the browser front end
//! to validate what the server sends back.

pub mod ids;
pub mod schema;
pub mod types;

pub use ids::assign_stable_ids;
pub use schema::{parse_analysis_result, parse_scenarios, SchemaError, SchemaIssue, Validated};
pub use types::{
    AnalysisResult, ApiInfo, DocumentType, ParameterRating, Priority, Scenario, TestCase,
    WebsiteInfo,
};
