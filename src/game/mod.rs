pub mod constants;
pub mod events;
pub mod food;
pub mod game_loop;
pub mod input;
pub mod performance;
pub mod spatial;
pub mod state;
pub mod systems;
pub mod worm;
