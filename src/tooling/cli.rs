//! CLI Tooling
//!
//! Command-line interface over [`DocumentGenerationClient`]: manage
//! configurations and their template storage trees, list templates, and
//! generate or convert documents.

use crate::client::{DocumentGenerationClient, PollOptions};
use crate::config::{ConfigLoader, DocGenConfig};
use crate::directory::{DirectoryOutline, DirectoryTree, SyncStats};
use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::logging::LoggingConfig;
use crate::messages::{
    ConfigurationListItem, DocumentConversionRequestDetails, DocumentFormat,
    DocumentGenerationProgress, DocumentGenerationRequestDetails, DocumentGenerationTemplate,
};
use crate::transport::ConfigurationRequest;
use crate::types::{ConfigurationId, RequestId, SubscriptionId};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Document generation client
#[derive(Parser)]
#[command(name = "docgen")]
#[command(about = "Manage document generation configurations and generate documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Subscription id (overrides service.subscription_id)
    #[arg(long)]
    pub subscription: Option<SubscriptionId>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configurations of the subscription
    Configurations {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a configuration, optionally with a directory tree
    Create {
        name: String,
        /// Level names, outermost first
        #[arg(long = "level", value_delimiter = ',')]
        levels: Vec<String>,
        #[arg(long)]
        has_license: bool,
        /// Extension of metadata files (e.g. .json)
        #[arg(long)]
        metadata_extension: Option<String>,
        /// TOML directory outline to create along with the configuration
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show a configuration and its template storage directories
    Show {
        configuration_id: ConfigurationId,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Write the directory tree as a TOML outline to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Apply a TOML directory outline to a configuration and save it
    Sync {
        configuration_id: ConfigurationId,
        #[arg(long)]
        file: PathBuf,
    },
    /// List templates visible from a directory
    Templates {
        configuration_id: ConfigurationId,
        /// Hierarchy path of the directory
        #[arg(long, default_value = "\\")]
        path: HierarchyPath,
        /// Only templates whose subject contains this text
        #[arg(long)]
        subject: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Download a template's metadata
    Metadata {
        configuration_id: ConfigurationId,
        template_id: String,
        #[arg(long, default_value = "\\")]
        path: HierarchyPath,
        #[arg(long, default_value = "en")]
        language: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a document and download it
    Generate {
        configuration_id: ConfigurationId,
        template_id: String,
        /// Merge data as a JSON file
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "\\")]
        path: HierarchyPath,
        #[arg(long, default_value = "en")]
        language: String,
        /// Output format (txt, rtf, doc, docx, pdf)
        #[arg(long = "document-format", default_value = "docx")]
        document_format: DocumentFormat,
        /// Destination file; defaults to <request id>.<extension>
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only submit the request and print its id
        #[arg(long)]
        no_wait: bool,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Convert a document to PDF/A and download it
    Convert {
        configuration_id: ConfigurationId,
        /// Publicly readable URL of the source document
        source_url: String,
        /// Format of the source document
        #[arg(long = "source-format", default_value = "docx")]
        source_format: DocumentFormat,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_wait: bool,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Show the state of a generation or conversion request
    Status {
        request_id: RequestId,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete a configuration and all its directories
    Delete {
        configuration_id: ConfigurationId,
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PollArgs {
    /// Give up waiting after this many seconds
    #[arg(long, default_value = "300")]
    pub timeout_secs: u64,
    /// Seconds between progress checks
    #[arg(long, default_value = "2")]
    pub interval_secs: u64,
}

impl From<PollArgs> for PollOptions {
    fn from(args: PollArgs) -> Self {
        PollOptions {
            timeout: Duration::from_secs(args.timeout_secs),
            interval: Duration::from_secs(args.interval_secs.max(1)),
        }
    }
}

/// CLI context holding the loaded configuration and client.
pub struct CliContext {
    client: DocumentGenerationClient,
    subscription_id: Option<SubscriptionId>,
}

impl Cli {
    /// Load configuration from `--config` and the standard sources.
    pub fn load_config(&self) -> Result<DocGenConfig, DocGenError> {
        ConfigLoader::load(self.config.as_deref())
    }

    /// Logging settings with command-line flags applied over `base`.
    /// `--log-file` is passed separately to `init_logging_with_file`.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        logging
    }
}

impl CliContext {
    /// Build an HTTP client from loaded configuration.
    pub fn from_config(
        config: &DocGenConfig,
        subscription_id: Option<SubscriptionId>,
    ) -> Result<Self, DocGenError> {
        let client = DocumentGenerationClient::from_options(&config.service)?;
        Ok(Self::with_client(client, subscription_id))
    }

    pub fn with_client(
        client: DocumentGenerationClient,
        subscription_id: Option<SubscriptionId>,
    ) -> Self {
        Self {
            client,
            subscription_id,
        }
    }

    pub fn client(&self) -> &DocumentGenerationClient {
        &self.client
    }

    /// Execute a CLI command, returning the text to print.
    pub async fn execute(&self, command: &Commands) -> Result<String, DocGenError> {
        let sub = self.subscription_id;
        match command {
            Commands::Configurations { format } => {
                let items = self.client.list_configurations(sub).await?;
                format_configurations(&items, format)
            }
            Commands::Create {
                name,
                levels,
                has_license,
                metadata_extension,
                file,
            } => {
                let outline = file.as_deref().map(read_outline).transpose()?;
                let request = ConfigurationRequest {
                    name: name.clone(),
                    has_license: *has_license,
                    level_names: levels.clone(),
                    metadata_filename_extension: metadata_extension.clone(),
                };
                let mut configuration = self.client.create_configuration(sub, &request).await?;
                let id = configuration.scope()?.configuration_id;
                let mut output = format!("Created configuration {} ({})\n", id, name);
                if let Some(outline) = outline {
                    outline.apply(configuration.tree_mut())?;
                    let stats = configuration.save().await?;
                    output.push_str(&format_sync_stats(&stats));
                }
                Ok(output)
            }
            Commands::Show {
                configuration_id,
                format,
                export,
            } => {
                let configuration = self.client.get_configuration(sub, *configuration_id).await?;
                if let Some(path) = export {
                    let root = configuration
                        .root_template_storage_directory()
                        .ok_or(DocGenError::MissingRootDirectory)?;
                    let outline = DirectoryOutline::capture(configuration.tree(), root)?;
                    write_outline(&outline, path)?;
                    info!(path = %path.display(), "Outline exported");
                }
                if format == "json" {
                    let directories = directory_rows(configuration.tree())?
                        .into_iter()
                        .map(|row| {
                            json!({
                                "path": row.path,
                                "name": row.name,
                                "id": row.id,
                                "storage_type": row.storage_type,
                            })
                        })
                        .collect::<Vec<_>>();
                    let out = json!({
                        "configuration_id": configuration_id,
                        "name": configuration.name(),
                        "level_names": configuration.level_names(),
                        "has_license": configuration.has_license(),
                        "metadata_filename_extension": configuration.metadata_filename_extension(),
                        "directories": directories,
                    });
                    return Ok(serde_json::to_string_pretty(&out)?);
                }
                let mut output = format!("Configuration: {}\n", configuration.name());
                output.push_str(&format!("Id: {}\n", configuration_id));
                output.push_str(&format!(
                    "Levels: {}\n",
                    if configuration.level_names().is_empty() {
                        "-".to_string()
                    } else {
                        configuration.level_names().join(", ")
                    }
                ));
                output.push_str(&format!("Licensed: {}\n", configuration.has_license()));
                if let Some(ext) = configuration.metadata_filename_extension() {
                    output.push_str(&format!("Metadata extension: {}\n", ext));
                }
                output.push('\n');
                output.push_str(&format_directory_table(configuration.tree())?);
                Ok(output)
            }
            Commands::Sync {
                configuration_id,
                file,
            } => {
                let outline = read_outline(file)?;
                let mut configuration = self.client.get_configuration(sub, *configuration_id).await?;
                outline.apply(configuration.tree_mut())?;
                let stats = configuration.save().await?;
                Ok(format_sync_stats(&stats))
            }
            Commands::Templates {
                configuration_id,
                path,
                subject,
                format,
            } => {
                let templates = self
                    .client
                    .get_templates(sub, *configuration_id, path, subject.as_deref())
                    .await?;
                format_templates(&templates, format)
            }
            Commands::Metadata {
                configuration_id,
                template_id,
                path,
                language,
                output,
            } => {
                let bytes = self
                    .client
                    .get_metadata(sub, *configuration_id, path, template_id, language)
                    .await?;
                match output {
                    Some(target) => {
                        tokio::fs::write(target, &bytes).await?;
                        Ok(format!("Wrote {} bytes to {}", bytes.len(), target.display()))
                    }
                    None => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                }
            }
            Commands::Generate {
                configuration_id,
                template_id,
                data,
                path,
                language,
                document_format,
                output,
                no_wait,
                poll,
            } => {
                let raw = tokio::fs::read_to_string(data).await?;
                let merge_data: serde_json::Value = serde_json::from_str(&raw)?;
                let details = DocumentGenerationRequestDetails {
                    hierarchy_path: path.clone(),
                    template_id: template_id.clone(),
                    language: language.clone(),
                    document_format: *document_format,
                    merge_data,
                    callback_url: None,
                    debug: false,
                };
                let progress = self
                    .client
                    .request_document_generation(sub, *configuration_id, &details)
                    .await?;
                self.finish_request(progress, *no_wait, *poll, output.as_deref(), *document_format)
                    .await
            }
            Commands::Convert {
                configuration_id,
                source_url,
                source_format,
                output,
                no_wait,
                poll,
            } => {
                let details =
                    DocumentConversionRequestDetails::to_pdf_a(source_url.clone(), *source_format);
                let progress = self
                    .client
                    .request_document_conversion(sub, *configuration_id, &details)
                    .await?;
                self.finish_request(progress, *no_wait, *poll, output.as_deref(), DocumentFormat::Pdf)
                    .await
            }
            Commands::Status { request_id, format } => {
                let progress = self
                    .client
                    .get_document_generation_progress(sub, *request_id)
                    .await?;
                format_progress(&progress, format)
            }
            Commands::Delete {
                configuration_id,
                yes,
            } => {
                if !yes {
                    return Err(DocGenError::InvalidConfiguration(format!(
                        "Refusing to delete configuration {} without --yes",
                        configuration_id
                    )));
                }
                let configuration = self.client.get_configuration(sub, *configuration_id).await?;
                let name = configuration.name().to_string();
                configuration.delete().await?;
                Ok(format!("Deleted configuration {} ({})", configuration_id, name))
            }
        }
    }

    async fn finish_request(
        &self,
        progress: DocumentGenerationProgress,
        no_wait: bool,
        poll: PollArgs,
        output: Option<&Path>,
        format: DocumentFormat,
    ) -> Result<String, DocGenError> {
        if no_wait {
            return Ok(format!("Requested {}", progress.id));
        }
        let uri = self
            .client
            .wait_for_document(Some(progress.subscription_id), progress.id, poll.into())
            .await?;
        let target = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(format!("{}.{}", progress.id, format.extension())));
        let bytes = self.client.write_document_to_file(&uri, &target).await?;
        Ok(format!(
            "Request {} completed; wrote {} bytes to {}",
            progress.id,
            bytes,
            target.display()
        ))
    }
}

fn read_outline(path: &Path) -> Result<DirectoryOutline, DocGenError> {
    let raw = std::fs::read_to_string(path)?;
    let outline: DirectoryOutline = toml::from_str(&raw).map_err(|e| {
        DocGenError::InvalidConfiguration(format!("Invalid outline {}: {}", path.display(), e))
    })?;
    outline.validate()?;
    Ok(outline)
}

fn write_outline(outline: &DirectoryOutline, path: &Path) -> Result<(), DocGenError> {
    let raw = toml::to_string_pretty(outline)
        .map_err(|e| DocGenError::InvalidConfiguration(format!("Cannot encode outline: {}", e)))?;
    std::fs::write(path, raw)?;
    Ok(())
}

struct DirectoryRow {
    path: String,
    name: String,
    id: String,
    storage_type: String,
}

fn directory_rows(tree: &DirectoryTree) -> Result<Vec<DirectoryRow>, DocGenError> {
    let Some(root) = tree.root() else {
        return Ok(Vec::new());
    };
    tree.descendants(root)?
        .into_iter()
        .map(|node| {
            let record = tree.get(node)?;
            Ok(DirectoryRow {
                path: tree.hierarchy_path(node)?.to_string(),
                name: record.name().to_string(),
                id: record
                    .id()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                storage_type: record.storage_type().to_string(),
            })
        })
        .collect()
}

fn format_directory_table(tree: &DirectoryTree) -> Result<String, DocGenError> {
    let rows = directory_rows(tree)?;
    if rows.is_empty() {
        return Ok("No template storage directories.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Path", "Name", "Storage", "Entry Id"]);
    for row in &rows {
        table.add_row(vec![&row.path, &row.name, &row.storage_type, &row.id]);
    }
    Ok(table.to_string())
}

fn format_sync_stats(stats: &SyncStats) -> String {
    format!(
        "Saved: {} created, {} updated, {} deleted\n",
        stats.created, stats.updated, stats.deleted
    )
}

fn format_configurations(items: &[ConfigurationListItem], format: &str) -> Result<String, DocGenError> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(items)?);
    }
    if items.is_empty() {
        return Ok("No configurations found.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Configuration Id", "Name"]);
    for item in items {
        table.add_row(vec![item.configuration_id.to_string(), item.name.clone()]);
    }
    Ok(format!("{}\n\nTotal: {} configuration(s)", table, items.len()))
}

fn format_templates(templates: &[DocumentGenerationTemplate], format: &str) -> Result<String, DocGenError> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(templates)?);
    }
    if templates.is_empty() {
        return Ok("No templates found.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Template", "Languages"]);
    for template in templates {
        table.add_row(vec![template.template_id.clone(), template.languages.join(", ")]);
    }
    Ok(table.to_string())
}

fn format_progress(progress: &DocumentGenerationProgress, format: &str) -> Result<String, DocGenError> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(progress)?);
    }
    let mut output = format!("Request: {}\n", progress.id);
    output.push_str(&format!("State: {:?}\n", progress.state));
    if let Some(template_id) = &progress.template_id {
        output.push_str(&format!("Template: {}\n", template_id));
    }
    if !progress.hierarchy_path.is_empty() {
        output.push_str(&format!("Path: {}\n", progress.hierarchy_path));
    }
    if let Some(reason) = &progress.fail_reason {
        output.push_str(&format!("Failure: {}\n", reason));
    }
    Ok(output)
}
