//! Football trivia card generation: turns a pre-aggregated statistics
//! database into balanced true/false question cards and publishes them to an
//! external record store, keeping a history of everything ever generated.

pub mod constants;
pub mod controller;
pub mod cutoffs;
pub mod facts;
pub mod generators;
pub mod history;
pub mod orchestrator;
pub mod publish;
pub mod question;
pub mod testing;
pub mod util;
