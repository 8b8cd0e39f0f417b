//! Ridership analysis over the loaded dataset.
//!
//! This module decomposes the ridership series into trend, seasonal and
//! residual components, bins ridership against each weather covariate, and
//! correlates the numeric columns.

pub mod aggregate;
pub mod correlation;
pub mod decompose;
pub mod pipeline;
pub mod types;
pub mod utility;
