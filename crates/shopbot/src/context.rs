//! Builds the static system prompt once at startup.
//!
//! The menu and business profile come from plain-text documents. A missing document is
//! replaced with a placeholder so the assistant can still start.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::prompt_template::{load_prompt, load_prompt_file, SYSTEM_PROMPT_TEMPLATE};

pub const MENU_PLACEHOLDER: &str = "menu information not available";
pub const PROFILE_PLACEHOLDER: &str = "profile information not available";

/// Facts about the shop that are interpolated into the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    /// Name the assistant introduces itself with
    pub name: String,
    pub business_name: String,
    pub price_per_item: String,
    pub contact_whatsapp: String,
    pub contact_instagram: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "Ummu Nada Assistant".to_string(),
            business_name: "Ummu Nada".to_string(),
            price_per_item: "Rp. 1.250".to_string(),
            contact_whatsapp: "081254711633".to_string(),
            contact_instagram: "@ummunada, @ummunada.katering".to_string(),
        }
    }
}

/// Where the prompt inputs live on disk
#[derive(Debug, Clone)]
pub struct ContextSources {
    pub menu_path: PathBuf,
    pub profile_path: PathBuf,
    /// Overrides the built-in template when set
    pub template_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct PromptContext<'a> {
    #[serde(flatten)]
    business: &'a BusinessProfile,
    menu: String,
    profile: String,
}

/// Render the system prompt. Only a broken template is an error.
pub fn assemble_system_prompt(
    business: &BusinessProfile,
    sources: &ContextSources,
) -> Result<String, tera::Error> {
    let context = PromptContext {
        business,
        menu: read_document(&sources.menu_path, MENU_PLACEHOLDER),
        profile: read_document(&sources.profile_path, PROFILE_PLACEHOLDER),
    };

    let prompt = match &sources.template_path {
        Some(path) => load_prompt_file(path, &context)?,
        None => load_prompt(SYSTEM_PROMPT_TEMPLATE, &context)?,
    };
    info!(chars = prompt.len(), "System prompt assembled");
    Ok(prompt)
}

fn read_document(path: &Path, placeholder: &str) -> String {
    match fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("{} is empty - using placeholder content", path.display());
            placeholder.to_string()
        }
        Err(e) => {
            warn!("Could not read {}: {} - using placeholder content", path.display(), e);
            placeholder.to_string()
        }
    }
}
