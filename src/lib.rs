//! Narrow-margin and DVA (Democratic Voter Absenteeism) flippability scoring
//! for precinct-level election results.

pub mod config;
pub mod flippable;
pub mod import;
pub mod output;
pub mod scoring;
pub mod store;
pub mod votes;
