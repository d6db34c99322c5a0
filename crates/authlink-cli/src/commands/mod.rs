pub mod config;
pub mod import;
pub mod link;
pub mod normalize;
pub mod permutations;
pub mod run;
