/*!
Post-processing of LOBSTER output: COHP curves and orbital pools from
`COHPCAR.lobster`, site-projected DOS and its peaks from `DOSCAR.lobster`,
and the per-step quantities of a PES scan.
*/
extern crate nalgebra as na;
pub mod cohp;
pub mod config;
pub mod dos;
pub mod error;
pub mod parser;
pub mod plot;
pub mod scan;
#[cfg(test)]
mod test;

pub use error::{Error, Result};
