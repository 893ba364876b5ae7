use uuid::Uuid;

use crate::database::Database;
use crate::error::DbError;
use crate::models::ProjectViewer;

impl Database {
    /// Grants a user access to a project through a viewer id.
    ///
    /// A viewer id has at most one owner row.
    pub fn add_project_viewer(&self, viewer: &ProjectViewer) -> Result<(), DbError> {
        self.write(|tables| {
            if !tables.projects.contains(&viewer.project_id) {
                return Err(DbError::ProjectNotFound);
            }
            if !tables.users.contains(&viewer.user_id) {
                return Err(DbError::UserNotFound);
            }

            let conflict = tables.project_viewers.iter().any(|existing| {
                existing == viewer
                    || (viewer.is_owner
                        && existing.is_owner
                        && existing.viewer_id == viewer.viewer_id)
            });
            if conflict {
                return Err(DbError::ViewerAlreadyExists);
            }

            tables.project_viewers.push(viewer.clone());
            Ok(())
        })
    }

    pub fn project_viewers_by_viewer(&self, viewer_id: &Uuid) -> Result<Vec<ProjectViewer>, DbError> {
        let viewers = self.viewers_matching(|pv| pv.viewer_id == *viewer_id);
        if viewers.is_empty() {
            return Err(DbError::ProjectViewerNotFound);
        }
        Ok(viewers)
    }

    pub fn project_viewers_by_user(&self, user_id: &Uuid) -> Result<Vec<ProjectViewer>, DbError> {
        let viewers = self.viewers_matching(|pv| pv.user_id == *user_id);
        if viewers.is_empty() {
            return Err(DbError::UserNotConnectedToViewer);
        }
        Ok(viewers)
    }

    pub fn delete_project_viewer_by_viewer(&self, viewer_id: &Uuid) -> Result<(), DbError> {
        self.delete_viewers_matching(|pv| pv.viewer_id == *viewer_id)
    }

    pub fn delete_project_viewer_by_user(&self, user_id: &Uuid) -> Result<(), DbError> {
        self.delete_viewers_matching(|pv| pv.user_id == *user_id)
    }

    fn viewers_matching<P>(&self, predicate: P) -> Vec<ProjectViewer>
    where
        P: Fn(&ProjectViewer) -> bool,
    {
        self.snapshot()
            .project_viewers
            .iter()
            .filter(|pv| predicate(pv))
            .cloned()
            .collect()
    }

    fn delete_viewers_matching<P>(&self, predicate: P) -> Result<(), DbError>
    where
        P: Fn(&ProjectViewer) -> bool,
    {
        self.write(|tables| {
            let before = tables.project_viewers.len();
            tables.project_viewers.retain(|pv| !predicate(pv));
            let deleted = before - tables.project_viewers.len();
            if deleted == 0 {
                return Err(DbError::NoProjectViewerDeleted);
            }
            tracing::debug!("Deleted {} project viewer(s)", deleted);
            Ok(())
        })
    }
}
