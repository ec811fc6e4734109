//! Session record asserted by the authentication gateway.
//!
//! Field names on the wire follow the gateway's JSON encoding (PascalCase with
//! a handful of upper-case acronyms), so most fields carry an explicit rename.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The gateway's view of an authenticated session at request entry.
///
/// Immutable once parsed. Never persisted by this service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "DeletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Secret used to re-authenticate against the gateway.
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "IsAuthenticated")]
    pub is_authenticated: bool,
    #[serde(rename = "IsAdmin")]
    pub is_admin: bool,
    #[serde(rename = "ValidUntil")]
    pub valid_until: DateTime<Utc>,
    #[serde(rename = "Provider")]
    pub provider: String,
    #[serde(rename = "ClosedOn")]
    pub closed_on: Option<DateTime<Utc>>,
    #[serde(rename = "LastActivity")]
    pub last_activity: DateTime<Utc>,
    #[serde(rename = "SessionName")]
    pub session_name: String,
    #[serde(rename = "CreatedFrom")]
    pub created_from: String,

    // Client telemetry
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "UserAgent")]
    pub user_agent: String,
    #[serde(rename = "Referrer")]
    pub referrer: String,
    #[serde(rename = "BrowserFamily")]
    pub browser_family: String,
    #[serde(rename = "BrowserVersion")]
    pub browser_version: String,
    #[serde(rename = "OSFamily")]
    pub os_family: String,
    #[serde(rename = "OSVersion")]
    pub os_version: String,
    #[serde(rename = "DeviceFamily")]
    pub device_family: String,
    #[serde(rename = "DeviceBrand")]
    pub device_brand: String,
    #[serde(rename = "DeviceModel")]
    pub device_model: String,
    #[serde(rename = "GeoLocation")]
    pub geo_location: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "ZipCode")]
    pub zip_code: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "CountryCode")]
    pub country_code: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Continent")]
    pub continent: String,
    #[serde(rename = "JA4Fingerprint")]
    pub ja4_fingerprint: String,
}

impl Session {
    /// Whether the gateway has marked this session closed or expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.closed_on.is_some() || self.valid_until <= now
    }
}
