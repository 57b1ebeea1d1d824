mod model;
mod repository;

pub use model::{NewStockBarDB, StockBarDB};
pub use repository::BarRepository;
