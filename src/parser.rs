pub mod cohpcar;
pub mod doscar;
pub mod general;
pub mod poscar;
