pub mod equipment;
pub mod movement;
pub mod transition;
pub mod turn_input;
