pub mod people;
pub mod rankings;
pub mod submissions;
