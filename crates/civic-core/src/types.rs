//! Core domain types for civic issue reporting
//!
//! Defines the vocabulary shared by every workflow:
//! - Tracking identifiers (`YYYY-NNNN`)
//! - Issue categories, urgency levels and lifecycle statuses
//! - Responsible departments
//! - Locations, coordinates and contact details
//! - Form field names used in validation reports

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalize a user-facing selection value into its slug form.
fn slugify(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace([' ', '_'], "-")
        .replace('&', "and")
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Public tracking identifier for a submitted report (`YYYY-NNNN`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    /// Build the identifier for a reporting year and sequence number
    #[inline]
    #[must_use]
    pub fn new(year: i32, sequence: u32) -> Self {
        Self(format!("{year:04}-{sequence:04}"))
    }

    /// Reporting year encoded in the identifier
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or_default()
    }

    /// Sequence number within the reporting year
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.0[5..].parse().unwrap_or_default()
    }

    /// Borrow the textual form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrackingId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        let invalid = || ParseError::TrackingId(s.to_string());

        let (year, sequence) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || sequence.len() < 4 {
            return Err(invalid());
        }
        if !year.bytes().chain(sequence.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TrackingId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackingId> for String {
    fn from(value: TrackingId) -> Self {
        value.0
    }
}

/// Category of a reported problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Pothole,
    BrokenStreetlight,
    Graffiti,
    GarbageCollection,
    WaterLeak,
    DamagedSignage,
    SidewalkRepair,
    Other,
}

impl IssueType {
    /// Every category, in the order the report form offers them
    pub const ALL: [IssueType; 8] = [
        IssueType::Pothole,
        IssueType::BrokenStreetlight,
        IssueType::Graffiti,
        IssueType::GarbageCollection,
        IssueType::WaterLeak,
        IssueType::DamagedSignage,
        IssueType::SidewalkRepair,
        IssueType::Other,
    ];

    /// Selection value used by the form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Pothole => "pothole",
            IssueType::BrokenStreetlight => "broken-streetlight",
            IssueType::Graffiti => "graffiti",
            IssueType::GarbageCollection => "garbage-collection",
            IssueType::WaterLeak => "water-leak",
            IssueType::DamagedSignage => "damaged-signage",
            IssueType::SidewalkRepair => "sidewalk-repair",
            IssueType::Other => "other",
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            IssueType::Pothole => "Pothole",
            IssueType::BrokenStreetlight => "Broken Streetlight",
            IssueType::Graffiti => "Graffiti",
            IssueType::GarbageCollection => "Garbage Collection",
            IssueType::WaterLeak => "Water Leak",
            IssueType::DamagedSignage => "Damaged Signage",
            IssueType::SidewalkRepair => "Sidewalk Repair",
            IssueType::Other => "Other",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IssueType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = slugify(s);
        IssueType::ALL
            .into_iter()
            .find(|t| t.as_str() == slug)
            .ok_or_else(|| ParseError::IssueType(s.to_string()))
    }
}

/// How urgently an issue needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Urgency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = slugify(s);
        Urgency::ALL
            .into_iter()
            .find(|u| u.as_str() == slug)
            .ok_or_else(|| ParseError::Urgency(s.to_string()))
    }
}

/// Lifecycle status of a submitted report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    /// Submitted, awaiting triage
    Pending,
    /// Routed to a department
    Assigned,
    /// Crew working on it
    InProgress,
    /// Blocked on materials
    RequiresMaterials,
    /// Paused
    OnHold,
    /// Completed; terminal
    Resolved,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 6] = [
        IssueStatus::Pending,
        IssueStatus::Assigned,
        IssueStatus::InProgress,
        IssueStatus::RequiresMaterials,
        IssueStatus::OnHold,
        IssueStatus::Resolved,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::Assigned => "assigned",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::RequiresMaterials => "requires-materials",
            IssueStatus::OnHold => "on-hold",
            IssueStatus::Resolved => "resolved",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "Pending",
            IssueStatus::Assigned => "Assigned",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::RequiresMaterials => "Requires Materials",
            IssueStatus::OnHold => "On Hold",
            IssueStatus::Resolved => "Resolved",
        }
    }

    /// No transition leaves a terminal status
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, IssueStatus::Resolved)
    }

    /// Work has started and not yet finished
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            IssueStatus::InProgress | IssueStatus::RequiresMaterials | IssueStatus::OnHold
        )
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IssueStatus {
    type Err = ParseError;

    /// Accepts slugs, labels, and the department dialog's `completed` value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = slugify(s);
        if slug == "completed" {
            return Ok(IssueStatus::Resolved);
        }
        IssueStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == slug)
            .ok_or_else(|| ParseError::Status(s.to_string()))
    }
}

/// City department responsible for fixing an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Department {
    StreetMaintenance,
    Sanitation,
    PublicWorks,
    ParksAndRecreation,
    TrafficManagement,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::StreetMaintenance,
        Department::Sanitation,
        Department::PublicWorks,
        Department::ParksAndRecreation,
        Department::TrafficManagement,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::StreetMaintenance => "street-maintenance",
            Department::Sanitation => "sanitation",
            Department::PublicWorks => "public-works",
            Department::ParksAndRecreation => "parks-and-recreation",
            Department::TrafficManagement => "traffic-management",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Department::StreetMaintenance => "Street Maintenance",
            Department::Sanitation => "Sanitation",
            Department::PublicWorks => "Public Works",
            Department::ParksAndRecreation => "Parks & Recreation",
            Department::TrafficManagement => "Traffic Management",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Department {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = slugify(s);
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == slug)
            .ok_or_else(|| ParseError::Department(s.to_string()))
    }
}

/// Resolved device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[inline]
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    /// Four decimal places, e.g. `40.7128, -74.0060`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Where an issue is: a typed address, a resolved position, or both
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Location from free text
    #[must_use]
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            coordinates: None,
        }
    }

    /// Location from a resolved position
    #[must_use]
    pub fn coordinates(coordinates: Coordinates) -> Self {
        Self {
            address: None,
            coordinates: Some(coordinates),
        }
    }

    /// Neither a non-blank address nor coordinates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_none()
            && self
                .address
                .as_deref()
                .map_or(true, |a| a.trim().is_empty())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.address.as_deref(), self.coordinates) {
            (Some(address), Some(coords)) => write!(f, "{address} ({coords})"),
            (Some(address), None) => f.write_str(address),
            (None, Some(coords)) => write!(f, "{coords}"),
            (None, None) => Ok(()),
        }
    }
}

/// Optional reporter contact details; only presence matters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Contact {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Report form fields, used to name missing input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Field {
    IssueType,
    Urgency,
    Location,
    Description,
    ContactName,
    ContactEmail,
    Attachments,
}

impl Field {
    /// Fields that must be non-empty for a report to be accepted
    pub const REQUIRED: [Field; 4] = [
        Field::IssueType,
        Field::Urgency,
        Field::Location,
        Field::Description,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::IssueType => "type",
            Field::Urgency => "urgency",
            Field::Location => "location",
            Field::Description => "description",
            Field::ContactName => "name",
            Field::ContactEmail => "email",
            Field::Attachments => "attachments",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        Field::REQUIRED.contains(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_id_format() {
        let id = TrackingId::new(2024, 156);
        assert_eq!(id.as_str(), "2024-0156");
        assert_eq!(id.year(), 2024);
        assert_eq!(id.sequence(), 156);
    }

    #[test]
    fn tracking_id_parse() {
        assert_eq!("#2024-0156".parse::<TrackingId>().unwrap(), TrackingId::new(2024, 156));
        assert!("2024-15".parse::<TrackingId>().is_err());
        assert!("24-0156".parse::<TrackingId>().is_err());
        assert!("2024-01a6".parse::<TrackingId>().is_err());
        assert!("20240156".parse::<TrackingId>().is_err());
    }

    #[test]
    fn selection_values_parse() {
        assert_eq!("Broken Streetlight".parse::<IssueType>().unwrap(), IssueType::BrokenStreetlight);
        assert_eq!("water-leak".parse::<IssueType>().unwrap(), IssueType::WaterLeak);
        assert_eq!("HIGH".parse::<Urgency>().unwrap(), Urgency::High);
        assert_eq!("In Progress".parse::<IssueStatus>().unwrap(), IssueStatus::InProgress);
        assert_eq!("completed".parse::<IssueStatus>().unwrap(), IssueStatus::Resolved);
        assert_eq!("Parks & Recreation".parse::<Department>().unwrap(), Department::ParksAndRecreation);
        assert!("sinkhole".parse::<IssueType>().is_err());
    }

    #[test]
    fn coordinates_display_four_decimals() {
        let c = Coordinates::new(40.712_776, -74.005_974);
        assert_eq!(c.to_string(), "40.7128, -74.0060");
    }

    #[test]
    fn location_emptiness() {
        assert!(Location::default().is_empty());
        assert!(Location::address("   ").is_empty());
        assert!(!Location::address("Main St").is_empty());
        assert!(!Location::coordinates(Coordinates::new(1.0, 2.0)).is_empty());
    }

    #[test]
    fn status_serializes_as_slug() {
        let json = serde_json::to_string(&IssueStatus::RequiresMaterials).unwrap();
        assert_eq!(json, "\"requires-materials\"");
    }
}
