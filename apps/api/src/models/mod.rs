pub mod input;
pub mod letter;
pub mod params;
pub mod research;
