pub mod practice_area;
