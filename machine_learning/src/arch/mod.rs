mod linear;
pub mod loss;
pub(crate) mod model;
pub mod qnn;

pub use linear::Linear;
pub use model::Model;
pub use qnn::IqpeReuploadSu2Parity;
