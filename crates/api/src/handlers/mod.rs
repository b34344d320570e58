pub mod lot;
pub mod occupancies;
pub mod spots;
