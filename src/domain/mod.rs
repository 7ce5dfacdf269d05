// Domain layer: module request/response models and ports (interfaces).

pub mod model;
pub mod ports;
