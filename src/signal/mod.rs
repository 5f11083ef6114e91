pub mod alert;
pub mod behavior;
pub mod drivers;
pub mod exposure;
pub mod features;
pub mod flow;
pub mod participation;
