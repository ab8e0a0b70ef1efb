pub mod anf;
pub mod cli;
pub mod demos;
pub mod error;
pub mod export;
pub mod ir;
pub mod liveness;
pub mod pipeline;
pub mod registers;
pub mod trace;
pub mod verification;

#[cfg(test)]
mod test_helpers;
