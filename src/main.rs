mod db;
mod registry;
mod web;
mod wol;

use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use clap::Parser;
use log::info;

use registry::DeviceRegistry;
use wol::{DEFAULT_BROADCAST, DEFAULT_WOL_PORT, WakeDispatcher};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3001")]
    http_addr: String,

    /// Path to the SQLite device database (DATABASE_URL overrides this)
    #[arg(long, default_value = "devices.db")]
    database: String,

    /// Broadcast address used for devices without one configured
    #[arg(long, default_value = DEFAULT_BROADCAST)]
    broadcast: String,

    /// UDP destination port for magic packets
    #[arg(long, default_value_t = DEFAULT_WOL_PORT)]
    wol_port: u16,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .init();

    let db_path = db::resolve_database_path(&args.database);
    info!("Opening device database at {}", db_path);
    let registry = Data::new(DeviceRegistry::open(&db_path)?);
    let dispatcher = Data::new(WakeDispatcher::new(args.broadcast.clone(), args.wol_port));

    info!("Starting web server on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .app_data(dispatcher.clone())
            .wrap(Logger::default())
            .configure(web::configure)
    })
    .bind(&args.http_addr)?
    .run()
    .await?;

    Ok(())
}
