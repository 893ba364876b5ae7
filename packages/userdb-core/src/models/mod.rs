//! Domain records and their wire representations.

pub mod asset;
pub mod privilege;
pub mod product;
pub mod project;
pub mod user;

pub use asset::{Asset, DataMap, BASE_ASSET_PATH};
pub use privilege::{Privilege, Privileges};
pub use product::{Product, ProductData, ProductUser};
pub use project::{Project, ProjectData, ProjectUser, ProjectViewer, Visibility};
pub use user::{User, UserData};
