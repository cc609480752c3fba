//! Database layer (record store).

pub mod firestore;
pub mod memory;
pub mod store;

pub use store::RecordStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ACTIVITIES: &str = "activities";
    pub const CERTIFICATES: &str = "certificates";
    /// Skill rollups (keyed by student ID)
    pub const STUDENT_SKILLS: &str = "student_skills";
}
