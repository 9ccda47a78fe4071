//
// Interval abstract interpretation
//
pub mod bound;
pub mod evaluator;
pub mod generic;
pub mod interval;
pub mod state;
pub mod value;
pub mod worklist;
