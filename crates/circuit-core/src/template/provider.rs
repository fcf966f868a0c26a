//! Template provider trait.

use super::model::Template;
use crate::error::Result;
use async_trait::async_trait;

/// Looks up editable templates by ID.
///
/// The content library behind this trait (search, media, editing) is not
/// part of Circuit; sessions only need to read a template once at start.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// Finds a template by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Template))`: Template found
    /// - `Ok(None)`: Template not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn get_template(&self, template_id: &str) -> Result<Option<Template>>;
}
