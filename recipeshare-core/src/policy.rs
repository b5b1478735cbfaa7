//! Role checks for recipe operations.
//!
//! A [`Principal`] is built for every authenticated request from the caller's
//! profile row. Every check here is a pure decision; callers turn a
//! [`Denied`] into a 403 response.

use thiserror::Error;
use uuid::Uuid;

/// Role flags from a user's profile. The two flags are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    pub is_creator: bool,
    pub is_viewer: bool,
}

/// The authenticated caller of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub roles: Roles,
}

/// Which recipes a caller may see when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeScope {
    All,
    CreatedBy(Uuid),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    #[error("You don't have permission to view this content.")]
    ListRecipes,

    #[error("You must be a creator to create recipes.")]
    CreateRecipe,

    #[error("You do not have permission to modify this recipe.")]
    ModifyRecipe,

    #[error("You do not have permission to delete this recipe.")]
    DeleteRecipe,

    #[error("Only viewers can favorite recipes.")]
    FavoriteRecipe,

    #[error("Only creators can upload recipes in bulk.")]
    BulkImport,
}

impl Principal {
    pub fn new(user_id: Uuid, roles: Roles) -> Self {
        Self { user_id, roles }
    }

    /// Viewers see everything, even if they are also creators.
    pub fn recipe_scope(&self) -> Result<RecipeScope, Denied> {
        if self.roles.is_viewer {
            Ok(RecipeScope::All)
        } else if self.roles.is_creator {
            Ok(RecipeScope::CreatedBy(self.user_id))
        } else {
            Err(Denied::ListRecipes)
        }
    }

    pub fn ensure_can_create(&self) -> Result<(), Denied> {
        if self.roles.is_creator {
            Ok(())
        } else {
            Err(Denied::CreateRecipe)
        }
    }

    pub fn ensure_can_modify(&self, creator_id: Option<Uuid>) -> Result<(), Denied> {
        if self.owns(creator_id) {
            Ok(())
        } else {
            Err(Denied::ModifyRecipe)
        }
    }

    pub fn ensure_can_delete(&self, creator_id: Option<Uuid>) -> Result<(), Denied> {
        if self.owns(creator_id) {
            Ok(())
        } else {
            Err(Denied::DeleteRecipe)
        }
    }

    pub fn ensure_can_favorite(&self) -> Result<(), Denied> {
        if self.roles.is_viewer {
            Ok(())
        } else {
            Err(Denied::FavoriteRecipe)
        }
    }

    pub fn ensure_can_bulk_import(&self) -> Result<(), Denied> {
        if self.roles.is_creator {
            Ok(())
        } else {
            Err(Denied::BulkImport)
        }
    }

    // A recipe without a creator has no owner and cannot be changed here.
    fn owns(&self, creator_id: Option<Uuid>) -> bool {
        self.roles.is_creator && creator_id == Some(self.user_id)
    }
}
