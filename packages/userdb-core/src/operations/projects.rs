use serde_json::Value;
use uuid::Uuid;

use super::collect_found;
use crate::database::Database;
use crate::error::DbError;
use crate::models::project::{DETAIL_NAME, DETAIL_VISIBILITY};
use crate::models::{Project, ProjectData, ProjectUser, Visibility};

impl Database {
    /// Creates a project under a product, owned by `owner_id`.
    ///
    /// Project names are unique within a product.
    pub fn create_project(
        &self,
        name: &str,
        visibility: Visibility,
        owner_id: &Uuid,
        product_id: &Uuid,
    ) -> Result<ProjectData, DbError> {
        self.write(|tables| {
            if !tables.products.contains(product_id) {
                return Err(DbError::ProductNotFound);
            }
            if !tables.users.contains(owner_id) {
                return Err(DbError::UserNotFound);
            }

            let name_taken = tables
                .projects
                .iter()
                .filter(|p| p.product_id == *product_id)
                .filter_map(|p| tables.assets.get(&p.details_id))
                .any(|details| details.datamap.get(DETAIL_NAME).and_then(Value::as_str) == Some(name));
            if name_taken {
                return Err(DbError::ProjectExists(name.to_string()));
            }
            let owner = tables.owner_privilege()?;

            let mut details = self.new_asset()?;
            details
                .datamap
                .insert(DETAIL_NAME.to_string(), Value::String(name.to_string()));
            details.datamap.insert(
                DETAIL_VISIBILITY.to_string(),
                Value::String(visibility.to_string()),
            );
            let assets = self.new_asset()?;
            let project = Project {
                id: Uuid::new_v4(),
                product_id: *product_id,
                details_id: details.id,
                assets_id: assets.id,
            };

            tables.assets.insert(details);
            tables.assets.insert(assets);
            tables.projects.insert(project.clone());
            tables.project_users.push(ProjectUser {
                project_id: project.id,
                user_id: *owner_id,
                privilege: owner,
            });
            tracing::debug!("Created project {} in product {}", project.id, product_id);
            tables.project_data(&project)
        })
    }

    pub fn project(&self, id: &Uuid) -> Result<ProjectData, DbError> {
        let tables = self.snapshot();
        let project = tables.projects.get(id).ok_or(DbError::ProjectNotFound)?;
        tables.project_data(project)
    }

    /// Returns the projects found among `ids`, in request order.
    pub fn projects(&self, ids: &[Uuid]) -> Result<Vec<ProjectData>, DbError> {
        let tables = self.snapshot();
        collect_found(ids, DbError::ProjectNotFound, |id| {
            tables
                .projects
                .get(id)
                .map(|p| tables.project_data(p))
                .transpose()
        })
    }

    /// Returns the projects of a product in creation order.
    pub fn product_projects(&self, product_id: &Uuid) -> Result<Vec<ProjectData>, DbError> {
        let tables = self.snapshot();
        let projects = tables
            .projects
            .iter()
            .filter(|p| p.product_id == *product_id)
            .map(|p| tables.project_data(p))
            .collect::<Result<Vec<_>, _>>()?;

        if projects.is_empty() {
            return Err(DbError::NoProjectsForProduct);
        }
        Ok(projects)
    }

    /// Replaces the details datamap of a project.
    pub fn update_project_details(&self, project: &ProjectData) -> Result<(), DbError> {
        self.write(|tables| {
            let expected = tables
                .projects
                .get(&project.id)
                .ok_or(DbError::ProjectNotFound)?
                .details_id;
            tables.replace_asset(expected, &project.details, "project details")
        })
    }

    /// Replaces the assets datamap of a project.
    pub fn update_project_assets(&self, project: &ProjectData) -> Result<(), DbError> {
        self.write(|tables| {
            let expected = tables
                .projects
                .get(&project.id)
                .ok_or(DbError::ProjectNotFound)?
                .assets_id;
            tables.replace_asset(expected, &project.assets, "project assets")
        })
    }

    /// Deletes a project with its viewers, memberships and assets.
    pub fn delete_project(&self, id: &Uuid) -> Result<(), DbError> {
        self.write(|tables| {
            tables.remove_project(id).ok_or(DbError::ProjectNotFound)?;
            tracing::debug!("Deleted project {}", id);
            Ok(())
        })
    }
}
