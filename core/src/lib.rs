pub mod data;
pub mod graph;
pub mod oracle;
pub mod paths;
pub mod replay;
pub mod solvers;
pub mod structs;
pub use fxhash::FxHashMap;
