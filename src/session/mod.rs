pub mod input;
pub mod normalize;
pub mod practice;
pub mod scenario;
