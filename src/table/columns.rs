//! Column sets for the dashboard tables.

use serde::Serialize;

/// A table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Row field, also the `sortBy` value sent when the header is clicked.
    pub id: &'static str,
    pub header: &'static str,
    pub sortable: bool,
}

const fn sortable(id: &'static str, header: &'static str) -> Column {
    Column {
        id,
        header,
        sortable: true,
    }
}

pub const ROBOT_COLUMNS: &[Column] = &[
    sortable("serialNumber", "Serial Number"),
    sortable("type", "Type"),
    sortable("location", "Location"),
    sortable("charge", "Charge"),
    sortable("status", "Status"),
    sortable("connectivity", "Connectivity"),
];

pub const USER_COLUMNS: &[Column] = &[
    sortable("name", "Name"),
    sortable("email", "Email"),
    sortable("role", "Role"),
    sortable("isActive", "Status"),
    sortable("createdAt", "Created"),
    Column {
        id: "updatedAt",
        header: "Updated",
        sortable: false,
    },
];
