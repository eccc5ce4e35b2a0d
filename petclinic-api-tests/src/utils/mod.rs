//! The harness itself: profiles, filters, assertions, schemas, and the
//! scenario runner.

pub mod assertions;
pub mod errors;
pub mod filters;
pub mod logging;
pub mod profiles;
pub mod schema;
pub mod test_tools;
