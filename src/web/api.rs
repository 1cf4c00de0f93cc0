//! API handlers for the `/api/*` HTTP endpoints.

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{HttpResponse, Responder, delete, get, post, put};
use serde::{Deserialize, Serialize};

use crate::registry::{Device, DevicePatch, DeviceRegistry, RegistryError};
use crate::wol;
use crate::wol::WakeDispatcher;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

fn registry_error_response(e: &RegistryError) -> HttpResponse {
    let body = ErrorResponse {
        error: e.to_string(),
    };
    match e {
        RegistryError::NotFound(_) => HttpResponse::NotFound().json(body),
        RegistryError::DuplicateName(_) => HttpResponse::Conflict().json(body),
        RegistryError::InvalidMacAddress(_) | RegistryError::EmptyName => {
            HttpResponse::BadRequest().json(body)
        }
        RegistryError::Database(_) => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn task_error_response(e: tokio::task::JoinError) -> HttpResponse {
    log::error!("Wake task failed: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Internal error".to_string(),
    })
}

// ============================================================================
// Device CRUD
// ============================================================================

#[derive(Serialize)]
struct DeviceListResponse {
    devices: Vec<Device>,
    count: usize,
}

#[get("/api/devices")]
pub async fn list_devices(registry: Data<DeviceRegistry>) -> impl Responder {
    match registry.list() {
        Ok(devices) => {
            let count = devices.len();
            HttpResponse::Ok().json(DeviceListResponse { devices, count })
        }
        Err(e) => registry_error_response(&e),
    }
}

#[get("/api/devices/{name}")]
pub async fn get_device(registry: Data<DeviceRegistry>, name: Path<String>) -> impl Responder {
    match registry.get(&name) {
        Ok(device) => HttpResponse::Ok().json(device),
        Err(e) => registry_error_response(&e),
    }
}

#[derive(Serialize)]
struct AddDeviceResponse {
    message: String,
    device: Device,
}

#[post("/api/devices")]
pub async fn add_device(registry: Data<DeviceRegistry>, body: Json<Device>) -> impl Responder {
    match registry.add(&body) {
        Ok(device) => HttpResponse::Created().json(AddDeviceResponse {
            message: format!("Device '{}' added", device.name),
            device,
        }),
        Err(e) => registry_error_response(&e),
    }
}

#[put("/api/devices/{name}")]
pub async fn update_device(
    registry: Data<DeviceRegistry>,
    name: Path<String>,
    body: Json<DevicePatch>,
) -> impl Responder {
    match registry.update(&name, &body) {
        Ok(device) => HttpResponse::Ok().json(MessageResponse {
            message: format!("Device '{}' updated", device.name),
        }),
        Err(e) => registry_error_response(&e),
    }
}

#[delete("/api/devices/{name}")]
pub async fn delete_device(registry: Data<DeviceRegistry>, name: Path<String>) -> impl Responder {
    match registry.remove(&name) {
        Ok(device) => HttpResponse::Ok().json(MessageResponse {
            message: format!("Device '{}' deleted", device.name),
        }),
        Err(e) => registry_error_response(&e),
    }
}

// ============================================================================
// Wake endpoints
// ============================================================================

#[derive(Deserialize)]
pub struct WakeQuery {
    device: Option<String>,
    mac: Option<String>,
    broadcast: Option<String>,
    port: Option<u16>,
}

/// Wake a single target, by registered name or by raw MAC. The send itself
/// always answers 200 with a `WakeResult`; `success:false` means the packet
/// could not be handed to the network stack.
#[get("/api/wake")]
pub async fn wake(
    registry: Data<DeviceRegistry>,
    dispatcher: Data<WakeDispatcher>,
    query: Query<WakeQuery>,
) -> impl Responder {
    let query = query.into_inner();

    if let Some(name) = query.device {
        let device = match registry.get(&name) {
            Ok(device) => device,
            Err(e) => return registry_error_response(&e),
        };
        let result = tokio::task::spawn_blocking(move || {
            dispatcher.wake_mac(&device.name, &device.mac, device.broadcast.as_deref(), None)
        })
        .await;
        match result {
            Ok(result) => HttpResponse::Ok().json(result),
            Err(e) => task_error_response(e),
        }
    } else if let Some(mac) = query.mac {
        let broadcast = query.broadcast;
        let port = query.port;
        let result = tokio::task::spawn_blocking(move || {
            // Raw-MAC wake: no registry entry, the device field stays empty
            dispatcher.wake_mac("", &mac, broadcast.as_deref(), port)
        })
        .await;
        match result {
            Ok(result) => HttpResponse::Ok().json(result),
            Err(e) => task_error_response(e),
        }
    } else {
        HttpResponse::BadRequest().json(ErrorResponse {
            error: "either 'device' or 'mac' query parameter is required".to_string(),
        })
    }
}

#[post("/api/wake-all")]
pub async fn wake_all(
    registry: Data<DeviceRegistry>,
    dispatcher: Data<WakeDispatcher>,
) -> impl Responder {
    let result = tokio::task::spawn_blocking(move || {
        wol::wake_all(registry.get_ref(), dispatcher.get_ref())
    })
    .await;

    match result {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(e)) => registry_error_response(&e),
        Err(e) => task_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct WakeMultipleRequest {
    devices: Vec<String>,
}

#[post("/api/wake-multiple")]
pub async fn wake_multiple(
    registry: Data<DeviceRegistry>,
    dispatcher: Data<WakeDispatcher>,
    body: Json<WakeMultipleRequest>,
) -> impl Responder {
    let names = body.into_inner().devices;
    let result = tokio::task::spawn_blocking(move || {
        wol::wake_named(registry.get_ref(), dispatcher.get_ref(), &names)
    })
    .await;

    match result {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(e)) => registry_error_response(&e),
        Err(e) => task_error_response(e),
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(rename = "deviceCount")]
    device_count: usize,
}

#[get("/api/health")]
pub async fn health(registry: Data<DeviceRegistry>) -> impl Responder {
    match registry.count() {
        Ok(device_count) => HttpResponse::Ok().json(HealthResponse {
            status: "ok",
            device_count,
        }),
        Err(e) => registry_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::registry::new_test_registry;

    async fn test_app() -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        let registry = Data::new(new_test_registry());
        let dispatcher = Data::new(WakeDispatcher::default());
        test::init_service(
            App::new()
                .app_data(registry)
                .app_data(dispatcher)
                .configure(crate::web::configure),
        )
        .await
    }

    #[actix_web::test]
    async fn test_add_and_list_devices() {
        let app = test_app().await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(json!({"name": "server", "mac": "00:11:22:33:44:55", "ip": "192.168.1.10"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/devices").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["devices"][0]["name"], "server");
        assert_eq!(body["devices"][0]["mac"], "00:11:22:33:44:55");
        assert_eq!(body["devices"][0]["ip"], "192.168.1.10");
    }

    #[actix_web::test]
    async fn test_add_duplicate_device_conflicts() {
        let app = test_app().await;

        let device = json!({"name": "server", "mac": "00:11:22:33:44:55"});
        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(&device)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(&device)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "device 'server' already exists");
    }

    #[actix_web::test]
    async fn test_add_device_with_bad_mac_is_rejected() {
        let app = test_app().await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(json!({"name": "server", "mac": "hello"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_update_and_delete_missing_device() {
        let app = test_app().await;

        let req = test::TestRequest::put()
            .uri("/api/devices/ghost")
            .set_json(json!({"ip": "10.0.0.1"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::delete()
            .uri("/api/devices/ghost")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "device 'ghost' not found");
    }

    #[actix_web::test]
    async fn test_wake_requires_device_or_mac() {
        let app = test_app().await;

        let req = test::TestRequest::get().uri("/api/wake").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_wake_unknown_device_is_not_found() {
        let app = test_app().await;

        let req = test::TestRequest::get()
            .uri("/api/wake?device=ghost")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_wake_by_raw_mac_reports_result() {
        let listener = std::net::UdpSocket::bind("127.0.0.1:0").expect("Failed to bind listener");
        let port = listener.local_addr().unwrap().port();
        let app = test_app().await;

        let uri = format!(
            "/api/wake?mac=00:11:22:33:44:55&broadcast=127.0.0.1&port={}",
            port
        );
        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["device"], "");
        assert_eq!(body["mac"], "00:11:22:33:44:55");

        let mut buf = [0u8; 256];
        let (len, _) = listener.recv_from(&mut buf).expect("Failed to receive datagram");
        assert_eq!(len, 102);
    }

    #[actix_web::test]
    async fn test_wake_multiple_reports_not_found_names() {
        let app = test_app().await;

        let req = test::TestRequest::post()
            .uri("/api/wake-multiple")
            .set_json(json!({"devices": ["ghost", "phantom"]}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["summary"]["total"], 0);
        assert_eq!(body["notFound"], json!(["ghost", "phantom"]));
    }

    #[actix_web::test]
    async fn test_wake_all_empty_registry() {
        let app = test_app().await;

        let req = test::TestRequest::post().uri("/api/wake-all").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["summary"]["total"], 0);
        assert_eq!(body["results"], json!([]));
    }

    #[actix_web::test]
    async fn test_health_reports_device_count() {
        let app = test_app().await;

        let req = test::TestRequest::post()
            .uri("/api/devices")
            .set_json(json!({"name": "server", "mac": "00:11:22:33:44:55"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["deviceCount"], 1);
    }
}
