pub mod cart;
pub mod cart_item;
pub mod document_counter;
pub mod order;
pub mod order_customer;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod product_image;
pub mod user;
