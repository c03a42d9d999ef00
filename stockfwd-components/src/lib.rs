pub mod assumptions;
pub mod errors;
pub mod recruitment;
pub mod residuals;
#[cfg(test)]
mod test_stock;
