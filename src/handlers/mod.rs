pub mod carts;
pub mod checkout;
pub mod common;
pub mod customers;
pub mod orders;
pub mod payment_webhooks;
pub mod products;
pub mod shipping;
