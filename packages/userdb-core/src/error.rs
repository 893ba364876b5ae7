//! Database error types.

use thiserror::Error;
use uuid::Uuid;

/// Database operation errors.
///
/// Display strings of the domain variants are part of the HTTP contract:
/// clients compare them verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// No user with the requested id or email
    #[error("The selected user not found")]
    UserNotFound,

    /// Another user already registered this email
    #[error("User with this email already exists")]
    DuplicateEmail,

    /// Another user already registered this name
    #[error("User with this name already exists")]
    DuplicateName,

    /// Email does not belong to the user being authenticated
    #[error("Invalid email or password")]
    InvalidEmailOrPassword,

    /// Password bytes do not match
    #[error("Invalid password")]
    InvalidPassword,

    /// Product name is taken
    #[error("Product with name {0} already exists")]
    ProductExists(String),

    /// No product with the requested id
    #[error("The selected product not found")]
    ProductNotFound,

    /// Membership list is empty
    #[error("At least one product user is required")]
    EmptyUsersList,

    /// Privilege id is not in the privilege table
    #[error("Unknown privilege {privilege} set for user {user}")]
    UnknownPrivilege { privilege: i64, user: Uuid },

    /// A product would end up with more than one owner
    #[error("Product must have a single owner")]
    InvalidOwnerCount,

    /// User is not a member of the product
    #[error("No user is associated to this product")]
    ProductUserNotAssociated,

    /// Project name is taken within the product
    #[error("Project with name {0} already exists")]
    ProjectExists(String),

    /// No project with the requested id
    #[error("The selected project not found")]
    ProjectNotFound,

    /// Product has no projects
    #[error("No projects for this product")]
    NoProjectsForProduct,

    /// Viewer id already has an owner, or the row exists
    #[error("Viewer already exists")]
    ViewerAlreadyExists,

    /// No viewer rows for the requested viewer id
    #[error("The selected project viewer not found")]
    ProjectViewerNotFound,

    /// No viewer rows for the requested user
    #[error("User is not connected to any viewer")]
    UserNotConnectedToViewer,

    /// Delete matched no viewer rows
    #[error("No project viewer was deleted")]
    NoProjectViewerDeleted,

    /// Asset id does not belong to the owning record
    #[error("This {0} is missing")]
    AssetMissing(&'static str),

    /// Asset key is not present
    #[error("Unknown asset reference type")]
    UnknownAssetReference,

    /// Asset has no base path to derive file paths from
    #[error("Asset {0} has no base asset path")]
    MissingBasePath(Uuid),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Lock poisoned (writer mutex poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl DbError {
    /// Returns true for errors caused by the request's data rather than by
    /// the server. These are reported to clients as accepted-but-failed.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            DbError::SerializationError(_)
                | DbError::LockPoisoned
                | DbError::DataCorruption(_)
                | DbError::DiskFull(_)
                | DbError::IoError(_)
                | DbError::TransientIoError(_)
                | DbError::MissingBasePath(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_messages() {
        assert_eq!(
            DbError::ProductExists("testProduct".to_string()).to_string(),
            "Product with name testProduct already exists"
        );
        assert_eq!(
            DbError::AssetMissing("user settings").to_string(),
            "This user settings is missing"
        );
        assert!(DbError::UserNotFound.is_domain());
        assert!(!DbError::LockPoisoned.is_domain());
        assert!(!DbError::IoError("boom".to_string()).is_domain());
    }
}
