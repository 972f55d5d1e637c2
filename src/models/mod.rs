pub mod k8s;
pub mod quantity;
pub mod views;
