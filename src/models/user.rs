use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Student,
    GpStudent,
    Staff,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::GpStudent => "gp_student",
            UserType::Staff => "staff",
        }
    }

    /// Hours of parking per reservation that are not billed.
    pub fn free_hours(&self) -> u32 {
        match self {
            UserType::Student => 2,
            UserType::GpStudent => 3,
            UserType::Staff => 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub university_id: String,
    pub phone_number: String,
    pub user_type: UserType,
    pub free_hours: u32,
}

impl User {
    pub fn new(
        id: String,
        full_name: String,
        university_id: String,
        phone_number: String,
        user_type: UserType,
    ) -> Self {
        Self {
            id,
            full_name,
            university_id,
            phone_number,
            user_type,
            free_hours: user_type.free_hours(),
        }
    }
}
