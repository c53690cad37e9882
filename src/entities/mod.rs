//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod application;
pub mod attendance;
pub mod hostel;
pub mod room;
pub mod room_photo;
pub mod session;
pub mod user;

// Re-export specific types to avoid conflicts
pub use application::{
    ApplicationStatus, Column as ApplicationColumn, Entity as Application,
    Model as ApplicationModel,
};
pub use attendance::{
    Column as AttendanceColumn, Entity as Attendance, Model as AttendanceModel,
};
pub use hostel::{Column as HostelColumn, Entity as Hostel, Model as HostelModel};
pub use room::{Column as RoomColumn, Entity as Room, Model as RoomModel};
pub use room_photo::{Column as RoomPhotoColumn, Entity as RoomPhoto, Model as RoomPhotoModel};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserRole};
