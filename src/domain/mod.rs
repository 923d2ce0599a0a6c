pub mod entities;
pub mod page_order;
