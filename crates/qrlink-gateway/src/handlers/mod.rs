mod health;
mod qrcodes;
mod redirect;

pub use health::health_handler;
pub use qrcodes::{
    create_qrcode_handler, delete_qrcode_handler, list_qrcodes_handler, list_visits_handler,
    update_qrcode_handler,
};
pub use redirect::{redirect_by_code_handler, redirect_by_slug_handler, REDIRECT_CACHE_CONTROL};
