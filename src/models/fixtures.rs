//! Backend documents for tests.

use super::{Connectivity, Robot, RobotStatus, RobotType, User, UserRole};

pub(crate) fn sample_robot(serial: &str, status: RobotStatus, charge: f64) -> Robot {
    Robot {
        serial_number: serial.to_string(),
        robot_type: RobotType::Tugger,
        location: "Dock A".to_string(),
        charge,
        status,
        connectivity: if status == RobotStatus::Inactive {
            Connectivity::Disconnected
        } else {
            Connectivity::Connected
        },
        last_seen: None,
        battery_health: None,
        firmware: None,
        task_count: None,
    }
}

pub(crate) fn sample_user(id: &str, role: UserRole, is_active: bool) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@fleet.test", id),
        role: role.as_str().to_string(),
        is_active,
        created_at: None,
        updated_at: None,
    }
}
