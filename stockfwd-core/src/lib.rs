pub mod control;
pub mod dynamics;
#[cfg(test)]
mod example_stock;
pub mod quantity;
pub mod recruitment;
pub mod solver;
pub mod timeline;

pub mod errors;
