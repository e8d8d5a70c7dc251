pub mod deadline;
pub mod domain;
pub mod pipeline;
pub mod report;
pub mod traits;
pub mod verdict;
