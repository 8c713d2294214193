use anyhow::Result;

use pings_types::models::{CheckIn, DeviceToken, FamilyMember, MedicationLog, Photo, UserProfile};

/// Store gateway used by the request handlers.
///
/// Each method is one keyed put/get/delete/query. Puts on an existing key
/// overwrite the whole record (last write wins) except for check-ins, which
/// are immutable and reject a duplicate id.
pub trait DocumentStore: Send + Sync {
    // -- Check-ins --
    fn put_check_in(&self, checkin: &CheckIn) -> Result<()>;
    /// Most recent first.
    fn recent_check_ins(&self, user_id: &str, limit: u32) -> Result<Vec<CheckIn>>;

    // -- Medications --
    fn put_medication_log(&self, log: &MedicationLog) -> Result<()>;

    // -- Photos --
    fn put_photo(&self, photo: &Photo) -> Result<()>;
    fn get_photo(&self, photo_id: &str) -> Result<Option<Photo>>;
    fn delete_photo(&self, photo_id: &str) -> Result<()>;

    // -- Users --
    fn put_user(&self, user: &UserProfile) -> Result<()>;
    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>>;

    // -- Family circles --
    fn put_family_member(&self, member: &FamilyMember) -> Result<()>;
    fn delete_family_member(&self, family_id: &str, user_id: &str) -> Result<()>;

    // -- Device tokens --
    fn put_device_token(&self, token: &DeviceToken) -> Result<()>;
    fn delete_device_token(&self, user_id: &str, device_token: &str) -> Result<()>;
    fn device_tokens(&self, user_id: &str) -> Result<Vec<DeviceToken>>;
}
