//! HTTP surface for the device registry and wake operations.

pub mod api;

use actix_web::web::ServiceConfig;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(api::list_devices)
        .service(api::get_device)
        .service(api::add_device)
        .service(api::update_device)
        .service(api::delete_device)
        .service(api::wake)
        .service(api::wake_all)
        .service(api::wake_multiple)
        .service(api::health);
}
