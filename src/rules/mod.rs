//! Rule set construction and snapshot rendering
//!
//! A fresh scan of the web root is turned into a canonical `RuleSet`, which is
//! rendered together with the static server options into a `ConfigSnapshot`.
//! Rendering is a pure function of the tree and the options: an unchanged
//! tree always yields byte-identical text, which keeps the supervisor from
//! restarting the server for nothing.

use std::path::{Path, PathBuf};

use log::debug;

use crate::models::{ConfigSnapshot, LightspawnError, RuleSet, ScanOptions, ScanResult, ServerOptions};
use crate::render::{Renderer, CONFIG_TEMPLATE, RULES_TEMPLATE};
use crate::scan;
use crate::writer::ConfigWriter;

/// Builds rule sets and renders them into snapshots
pub struct RuleSnapshotBuilder {
    renderer: Renderer,
    scan_options: ScanOptions,
    server_options: ServerOptions,
}

impl RuleSnapshotBuilder {
    pub fn new(renderer: Renderer, scan_options: ScanOptions, server_options: ServerOptions) -> Self {
        Self {
            renderer,
            scan_options,
            server_options,
        }
    }

    /// Turn a scan result into a canonical rule set
    pub fn build(scan: ScanResult, options: &ScanOptions) -> RuleSet {
        let denied = options
            .deny_list
            .iter()
            .map(|path| path.trim().trim_matches('/').to_string())
            .filter(|path| !path.is_empty())
            .collect();

        RuleSet::new(
            options.default_script(),
            denied,
            scan.scripts,
            scan.dirs,
            scan.files,
        )
    }

    /// Render a rule set and the server options into a snapshot
    pub fn render(&self, rules: &RuleSet) -> Result<ConfigSnapshot, LightspawnError> {
        let rules_text = self.renderer.render(RULES_TEMPLATE, rules)?;
        let config_text = self.renderer.render(CONFIG_TEMPLATE, &self.server_options)?;
        Ok(ConfigSnapshot::new(config_text, rules_text))
    }

    /// Scan the document root, build the rule set and render it
    pub fn snapshot(&self) -> Result<(RuleSet, ConfigSnapshot), LightspawnError> {
        let result = scan::scan_web_root(&self.server_options.document_root, &self.scan_options)?;
        let rules = Self::build(result, &self.scan_options);
        let snapshot = self.render(&rules)?;
        Ok((rules, snapshot))
    }
}

/// Generates the project's configuration files from the current web root
pub struct ConfigGenerator {
    builder: RuleSnapshotBuilder,
    writer: ConfigWriter,
    config_file: PathBuf,
    rules_file: PathBuf,
}

impl ConfigGenerator {
    pub fn new(builder: RuleSnapshotBuilder, config_file: PathBuf, rules_file: PathBuf) -> Self {
        Self {
            builder,
            writer: ConfigWriter::new(),
            config_file,
            rules_file,
        }
    }

    /// Scan and render without touching the disk
    pub fn generate(&self) -> Result<(RuleSet, ConfigSnapshot), LightspawnError> {
        self.builder.snapshot()
    }

    /// Write both the configuration and the rules
    pub fn write(&self, snapshot: &ConfigSnapshot, force: bool) -> Result<(), LightspawnError> {
        self.writer.write(&snapshot.config_text, &self.config_file, force)?;
        self.write_rules(snapshot, force)
    }

    /// Write only the rules, the file lighttpd includes from its configuration
    pub fn write_rules(&self, snapshot: &ConfigSnapshot, force: bool) -> Result<(), LightspawnError> {
        if self.writer.write(&snapshot.rules_text, &self.rules_file, force)? {
            debug!("Rules regenerated in {}", self.rules_file.display());
        }
        Ok(())
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn rules_file(&self) -> &Path {
        &self.rules_file
    }
}
