use serde::{Deserialize, Serialize};

/// A staff member is one column (resource) in the day planner. The roster
/// size is also the booking capacity of a time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub color: String,
    pub specialty: Option<String>,
}
