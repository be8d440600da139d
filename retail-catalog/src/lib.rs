pub mod product;
pub mod customer;
pub mod inventory;

pub use product::{CatalogError, CreateProductRequest, ProductService, UpdateProductRequest};
pub use customer::{CustomerError, CustomerService, RegisterCustomerRequest};
pub use inventory::{InventoryChecker, InventoryError};
