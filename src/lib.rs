pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod document;
pub mod error;
pub mod export;
pub mod git;
pub mod history;
pub mod metadata;
pub mod model;
pub mod report;
pub mod since;
