mod health;
mod qrcode;

pub use health::HealthResponse;
pub use qrcode::{CreateQrCodeRequest, DeleteResponse, UpdateQrCodeRequest, VisitsQuery};
