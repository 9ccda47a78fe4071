pub mod eog;
pub mod node;
