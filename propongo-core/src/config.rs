use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::BackendType;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "PROPONGO_CONFIG";

/// Environment variable overriding the store location
pub const STORE_ENV: &str = "PROPONGO_STORE";

const CONFIG_FILE_NAME: &str = ".propongo.yaml";
const DATA_DIR_NAME: &str = "propongo";

/// A pointer to further reading for one part of the proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpResource {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// User configuration, stored as YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the proposal store lives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Backend for the store; inferred from the path when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendType>,

    /// Help links keyed by `section.topic`, e.g. `budget.breakdown`
    pub help_resources: IndexMap<String, HelpResource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            backend: None,
            help_resources: default_help_resources(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the provided path
    ///
    /// Help topics missing from the file keep their default links.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let mut config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        for (topic, resource) in default_help_resources() {
            config.help_resources.entry(topic).or_insert(resource);
        }
        Ok(config)
    }

    /// Loads the config, or the defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Gets the help resource for a topic such as `scope.overview`
    pub fn help(&self, topic: &str) -> Option<&HelpResource> {
        self.help_resources.get(topic)
    }

    /// Updates the given fields of an existing help topic
    pub fn update_help(
        &mut self,
        topic: &str,
        title: Option<&str>,
        url: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let resource = self
            .help_resources
            .get_mut(topic)
            .with_context(|| format!("Unknown help topic '{}'", topic))?;

        if let Some(title) = title {
            resource.title = title.to_string();
        }
        if let Some(url) = url {
            resource.url = url.to_string();
        }
        if let Some(description) = description {
            resource.description = Some(description.to_string()).filter(|d| !d.trim().is_empty());
        }
        Ok(())
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home_dir.join(CONFIG_FILE_NAME))
}

/// Default store location inside the platform data directory
pub fn default_store_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(data_dir.join(DATA_DIR_NAME))
}

/// Resolves the store path
///
/// Priority: explicit path, then `PROPONGO_STORE`, then the config file,
/// then the platform data directory.
pub fn resolve_store_path(explicit: Option<&Path>, config: &AppConfig) -> Result<PathBuf> {
    let from_env = std::env::var(STORE_ENV).ok().filter(|v| !v.trim().is_empty());
    resolve_store_path_from(explicit, from_env.as_deref(), config)
}

fn resolve_store_path_from(explicit: Option<&Path>, from_env: Option<&str>, config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = from_env {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = &config.store_path {
        return Ok(path.clone());
    }
    default_store_path()
}

fn resource(title: &str, chapter: u32, description: &str) -> HelpResource {
    HelpResource {
        title: title.to_string(),
        url: format!("https://example.com/book/chapter{}", chapter),
        description: Some(description.to_string()),
    }
}

/// The built-in help links, one per editable part of the proposal
pub fn default_help_resources() -> IndexMap<String, HelpResource> {
    let entries = [
        ("scope.overview", resource("Writing an Effective Project Overview", 1,
            "Learn how to craft a compelling project overview that sets the stage for your proposal.")),
        ("scope.objectives", resource("Defining Clear Project Objectives", 2,
            "Guidelines for creating specific, measurable, achievable, relevant, and time-bound objectives.")),
        ("scope.deliverables", resource("Specifying Project Deliverables", 3,
            "How to clearly define what will be delivered to the client.")),
        ("scope.timeline", resource("Creating a Realistic Timeline", 4,
            "Tips for estimating project duration and creating a timeline that works.")),
        ("scope.risks", resource("Identifying and Addressing Project Risks", 5,
            "How to identify potential risks and develop mitigation strategies.")),
        ("scope.customSections", resource("Adding Custom Proposal Sections", 6,
            "Guidelines for when and how to add custom sections to your proposal.")),
        ("budget.breakdown", resource("Creating a Detailed Budget Breakdown", 7,
            "How to itemize costs and create a transparent budget that builds client trust.")),
        ("budget.narrative", resource("Writing an Effective Budget Narrative", 8,
            "Explaining your budget in a way that justifies costs and demonstrates value.")),
        ("budget.contingency", resource("Planning for Contingencies", 9,
            "How to account for unexpected costs and changes in project scope.")),
        ("qualifications.companyBackground", resource("Presenting Your Company Background", 10,
            "How to highlight your company's history, mission, and values in a relevant way.")),
        ("qualifications.teamMembers", resource("Showcasing Your Team", 11,
            "Best practices for presenting team members' qualifications and expertise.")),
        ("qualifications.relevantExperience", resource("Demonstrating Relevant Experience", 12,
            "How to select and present past projects that demonstrate your capability.")),
        ("qualifications.testimonials", resource("Including Effective Testimonials", 13,
            "Guidelines for selecting and presenting client testimonials that build credibility.")),
    ];

    entries
        .into_iter()
        .map(|(topic, resource)| (topic.to_string(), resource))
        .collect()
}
