//! Addresses
//!
//! Saved delivery addresses, plus the two browser-facing helpers the address
//! form relies on: geolocation error messages and parsing of the
//! reverse-geocoding response used to prefill the form.

use std::fmt;

use serde::Deserialize;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;
use tracing::debug;

new_key_type! {
    /// Address Key
    pub struct AddressKey;
}

/// Reverse-geocoding endpoint.
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Address errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Postcodes are six digits.
    #[error("invalid PIN code {0:?}")]
    InvalidPostcode(String),

    /// Phone numbers are ten digits.
    #[error("invalid phone number {0:?}")]
    InvalidPhone(String),

    /// No saved address has the key.
    #[error("address not found")]
    NotFound,

    /// The reverse-geocoding response could not be used.
    #[error("could not determine address from location: {0}")]
    ReverseGeocode(String),
}

/// Address tag shown on the address card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressLabel {
    /// Home
    #[default]
    Home,
    /// Work
    Work,
    /// Anything else
    Other,
}

impl fmt::Display for AddressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressLabel::Home => "Home",
            AddressLabel::Work => "Work",
            AddressLabel::Other => "Other",
        })
    }
}

/// Delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Tag
    pub label: AddressLabel,
    /// Recipient
    pub name: String,
    /// Contact number
    pub phone: String,
    /// House / flat and street
    pub line1: String,
    /// Area or locality
    pub line2: Option<String>,
    /// Nearby landmark
    pub landmark: Option<String>,
    /// City
    pub city: String,
    /// State
    pub state: String,
    /// PIN code
    pub postcode: String,
}

impl Address {
    /// Check the fields the address form marks as required.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postcode", &self.postcode),
        ];

        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AddressError::MissingField(field));
        }

        if !is_digits(&self.postcode, 6) {
            return Err(AddressError::InvalidPostcode(self.postcode.clone()));
        }

        if !is_digits(&self.phone, 10) {
            return Err(AddressError::InvalidPhone(self.phone.clone()));
        }

        Ok(())
    }

    /// One-line rendering for summaries.
    pub fn one_line(&self) -> String {
        [
            Some(self.line1.as_str()),
            self.line2.as_deref(),
            Some(self.city.as_str()),
            Some(self.state.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
            + " - "
            + &self.postcode
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    let value = value.trim();

    value.len() == len && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Saved addresses, with one marked as the default.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    addresses: SlotMap<AddressKey, Address>,
    order: Vec<AddressKey>,
    default: Option<AddressKey>,
}

impl AddressBook {
    /// Create an empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Save an address. The first address saved becomes the default.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] if the address fails validation.
    pub fn add(&mut self, address: Address, make_default: bool) -> Result<AddressKey, AddressError> {
        address.validate()?;

        let key = self.addresses.insert(address);
        self.order.push(key);

        if make_default || self.default.is_none() {
            self.default = Some(key);
        }

        debug!(?key, "saved address");

        Ok(key)
    }

    /// Delete an address. If it was the default, the oldest remaining one
    /// takes over.
    pub fn remove(&mut self, key: AddressKey) -> Option<Address> {
        let removed = self.addresses.remove(key)?;

        self.order.retain(|k| *k != key);

        if self.default == Some(key) {
            self.default = self.order.first().copied();
        }

        Some(removed)
    }

    /// Mark an address as the default.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown key.
    pub fn set_default(&mut self, key: AddressKey) -> Result<(), AddressError> {
        if !self.addresses.contains_key(key) {
            return Err(AddressError::NotFound);
        }

        self.default = Some(key);

        Ok(())
    }

    /// The default address.
    pub fn default_address(&self) -> Option<(AddressKey, &Address)> {
        let key = self.default?;

        self.addresses.get(key).map(|address| (key, address))
    }

    /// Look up an address.
    pub fn get(&self, key: AddressKey) -> Option<&Address> {
        self.addresses.get(key)
    }

    /// Addresses in the order they were saved.
    pub fn iter(&self) -> impl Iterator<Item = (AddressKey, &Address)> {
        self.order
            .iter()
            .filter_map(|key| self.addresses.get(*key).map(|address| (*key, address)))
    }

    /// Number of saved addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether no address is saved.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Failure reported by the browser's geolocation API.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    /// The shopper refused location access (code 1).
    #[error(
        "Location access denied. Please enable location permissions in your browser settings."
    )]
    PermissionDenied,

    /// The device could not determine a position (code 2).
    #[error("Location information is unavailable. Please try again.")]
    PositionUnavailable,

    /// The lookup took too long (code 3).
    #[error("Location request timed out. Please try again.")]
    Timeout,

    /// The browser has no geolocation API.
    #[error("Geolocation is not supported by your browser.")]
    Unsupported,
}

impl GeolocationError {
    /// Map a `GeolocationPositionError.code`.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::PermissionDenied),
            2 => Some(Self::PositionUnavailable),
            3 => Some(Self::Timeout),
            _ => None,
        }
    }

    /// Message shown to the shopper.
    pub fn message(self) -> String {
        self.to_string()
    }
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// URL of the reverse-geocoding lookup for this position.
    pub fn reverse_geocode_url(&self) -> String {
        format!(
            "{NOMINATIM_REVERSE_URL}?format=json&lat={}&lon={}",
            self.latitude, self.longitude
        )
    }
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    address: Option<ReverseGeocodeAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseGeocodeAddress {
    house_number: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
}

/// Address fields recovered from a location, used to prefill the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocatedAddress {
    /// House number and road
    pub line1: String,
    /// Suburb or neighbourhood
    pub line2: Option<String>,
    /// City, town or village
    pub city: String,
    /// State
    pub state: String,
    /// PIN code
    pub postcode: String,
}

impl LocatedAddress {
    /// Fill an address form with the located fields, keeping what the
    /// shopper already typed for the rest.
    pub fn prefill(self, mut address: Address) -> Address {
        if !self.line1.is_empty() {
            address.line1 = self.line1;
        }

        if self.line2.is_some() {
            address.line2 = self.line2;
        }

        address.city = self.city;
        address.state = self.state;
        address.postcode = self.postcode;

        address
    }
}

/// Parse a Nominatim `format=json` reverse-geocoding response.
///
/// # Errors
///
/// Returns [`AddressError::ReverseGeocode`] if the payload is not JSON or
/// carries no address.
pub fn parse_reverse_geocode(json: &str) -> Result<LocatedAddress, AddressError> {
    let response: ReverseGeocodeResponse =
        serde_json::from_str(json).map_err(|err| AddressError::ReverseGeocode(err.to_string()))?;

    let address = response
        .address
        .ok_or_else(|| AddressError::ReverseGeocode("response has no address".to_string()))?;

    let line1 = [address.house_number, address.road]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    Ok(LocatedAddress {
        line1,
        line2: address.suburb.or(address.neighbourhood),
        city: address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_default(),
        state: address.state.unwrap_or_default(),
        postcode: address.postcode.unwrap_or_default(),
    })
}
