pub mod draw;
pub mod intake;
