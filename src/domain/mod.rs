pub mod body;
pub mod collision;
pub mod error;
pub mod input;
pub mod jump;
pub mod movement;
pub mod rect;
