//! Device registry. CRUD over named Wake-on-LAN targets, keyed by unique
//! device name and persisted to SQLite so registrations survive restarts.

use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db;
use crate::wol::MacAddress;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("device '{0}' already exists")]
    DuplicateName(String),
    #[error("device '{0}' not found")]
    NotFound(String),
    #[error("invalid MAC address '{0}'")]
    InvalidMacAddress(String),
    #[error("device name must not be empty")]
    EmptyName,
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A registered wake target. `ip` is informational only; `broadcast`
/// overrides the dispatcher default when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<String>,
}

/// Partial update payload; absent fields keep their stored values.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub broadcast: Option<String>,
}

/// Owns the backing connection. Every mutating operation is a single
/// critical section (lookup, validate, write) behind the mutex, so
/// concurrent requests cannot interleave lost updates.
pub struct DeviceRegistry {
    conn: Mutex<Connection>,
}

impl DeviceRegistry {
    pub fn open(path: &str) -> Result<Self, RegistryError> {
        let conn = db::open_connection(path)?;
        Self::with_connection(conn)
    }

    pub fn with_connection(conn: Connection) -> Result<Self, RegistryError> {
        Self::create_table_if_not_exists(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn create_table_if_not_exists(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                mac TEXT NOT NULL,
                ip TEXT,
                broadcast TEXT,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_devices_name ON devices (name);",
            [],
        )?;
        Ok(())
    }

    /// All devices in insertion order.
    pub fn list(&self) -> Result<Vec<Device>, RegistryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT name, mac, ip, broadcast FROM devices ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Device {
                name: row.get(0)?,
                mac: row.get(1)?,
                ip: row.get(2)?,
                broadcast: row.get(3)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn get(&self, name: &str) -> Result<Device, RegistryError> {
        let conn = self.conn.lock().unwrap();
        Self::get_with_conn(&conn, name)
    }

    pub fn count(&self) -> Result<usize, RegistryError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert a new device. The MAC is validated and stored in its
    /// normalized form; the returned record reflects what was persisted.
    pub fn add(&self, device: &Device) -> Result<Device, RegistryError> {
        if device.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let mac = device
            .mac
            .parse::<MacAddress>()
            .map_err(|_| RegistryError::InvalidMacAddress(device.mac.clone()))?;

        let conn = self.conn.lock().unwrap();
        if Self::exists(&conn, &device.name)? {
            return Err(RegistryError::DuplicateName(device.name.clone()));
        }
        conn.execute(
            "INSERT INTO devices (name, mac, ip, broadcast, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                device.name,
                mac.to_string(),
                device.ip,
                device.broadcast,
                chrono::Utc::now().timestamp()
            ],
        )?;

        log::info!("Registered device '{}' ({})", device.name, mac);
        Ok(Device {
            mac: mac.to_string(),
            ..device.clone()
        })
    }

    /// Merge the patch over the stored record. Renaming onto another
    /// existing device is rejected; a patched MAC is revalidated.
    pub fn update(&self, name: &str, patch: &DevicePatch) -> Result<Device, RegistryError> {
        let conn = self.conn.lock().unwrap();
        let mut device = Self::get_with_conn(&conn, name)?;

        if let Some(new_name) = &patch.name {
            if new_name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if new_name != name && Self::exists(&conn, new_name)? {
                return Err(RegistryError::DuplicateName(new_name.clone()));
            }
            device.name = new_name.clone();
        }
        if let Some(mac) = &patch.mac {
            let parsed = mac
                .parse::<MacAddress>()
                .map_err(|_| RegistryError::InvalidMacAddress(mac.clone()))?;
            device.mac = parsed.to_string();
        }
        if let Some(ip) = &patch.ip {
            device.ip = Some(ip.clone());
        }
        if let Some(broadcast) = &patch.broadcast {
            device.broadcast = Some(broadcast.clone());
        }

        conn.execute(
            "UPDATE devices SET name = ?1, mac = ?2, ip = ?3, broadcast = ?4 WHERE name = ?5",
            params![device.name, device.mac, device.ip, device.broadcast, name],
        )?;
        Ok(device)
    }

    /// Delete by name, returning the removed record. Deleting an absent
    /// name reports `NotFound` without touching any state.
    pub fn remove(&self, name: &str) -> Result<Device, RegistryError> {
        let conn = self.conn.lock().unwrap();
        let device = Self::get_with_conn(&conn, name)?;
        conn.execute("DELETE FROM devices WHERE name = ?1", [name])?;
        log::info!("Removed device '{}'", name);
        Ok(device)
    }

    fn get_with_conn(conn: &Connection, name: &str) -> Result<Device, RegistryError> {
        conn.query_row(
            "SELECT name, mac, ip, broadcast FROM devices WHERE name = ?1",
            [name],
            |row| {
                Ok(Device {
                    name: row.get(0)?,
                    mac: row.get(1)?,
                    ip: row.get(2)?,
                    broadcast: row.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT COUNT(*) FROM devices WHERE name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
    }
}

#[cfg(test)]
pub fn new_test_registry() -> DeviceRegistry {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    DeviceRegistry::with_connection(conn).expect("Failed to create device table")
}
