pub mod market;
pub mod recommendation;
