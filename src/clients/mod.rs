pub mod midtrans;
pub mod rajaongkir;
