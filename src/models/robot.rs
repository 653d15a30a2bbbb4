//! Robot model matching the backend robot document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational state of a robot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RobotStatus {
    Active,
    Charging,
    Inactive,
}

impl RobotStatus {
    pub const ALL: [RobotStatus; 3] = [
        RobotStatus::Active,
        RobotStatus::Charging,
        RobotStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotStatus::Active => "ACTIVE",
            RobotStatus::Charging => "CHARGING",
            RobotStatus::Inactive => "INACTIVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Kind of robot hardware.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RobotType {
    Tugger,
    Conveyor,
    Forklift,
}

impl RobotType {
    pub const ALL: [RobotType; 3] = [RobotType::Tugger, RobotType::Conveyor, RobotType::Forklift];

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotType::Tugger => "TUGGER",
            RobotType::Conveyor => "CONVEYOR",
            RobotType::Forklift => "FORKLIFT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Link state between a robot and the fleet server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    pub const ALL: [Connectivity; 2] = [Connectivity::Connected, Connectivity::Disconnected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Connected => "CONNECTED",
            Connectivity::Disconnected => "DISCONNECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// A robot in the fleet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
    pub serial_number: String,
    #[serde(rename = "type")]
    pub robot_type: RobotType,
    pub location: String,
    /// Battery charge in percent
    pub charge: f64,
    pub status: RobotStatus,
    pub connectivity: Connectivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_count: Option<u32>,
}

/// Aggregate counters shown above the robots table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RobotStats {
    pub total: u64,
    pub active: u64,
    pub charging: u64,
    pub inactive: u64,
    pub connected: u64,
    pub disconnected: u64,
    pub average_charge: u64,
}

impl RobotStats {
    /// Count robots by status and connectivity.
    ///
    /// `total` is the backend's total count when one is known, since `robots`
    /// may be only the current page.
    pub fn from_robots(robots: &[Robot], total: Option<u64>) -> Self {
        let count = |pred: fn(&Robot) -> bool| robots.iter().filter(|r| pred(r)).count() as u64;

        let average_charge = if robots.is_empty() {
            0
        } else {
            let sum: f64 = robots.iter().map(|r| r.charge).sum();
            (sum / robots.len() as f64).round() as u64
        };

        Self {
            total: total.unwrap_or(robots.len() as u64),
            active: count(|r| r.status == RobotStatus::Active),
            charging: count(|r| r.status == RobotStatus::Charging),
            inactive: count(|r| r.status == RobotStatus::Inactive),
            connected: count(|r| r.connectivity == Connectivity::Connected),
            disconnected: count(|r| r.connectivity == Connectivity::Disconnected),
            average_charge,
        }
    }
}
