// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Technology commands
//!
//! Commands: list, show, export, validate, import

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use lytech_core::application::{ImportReport, TechnologyRegistry};
use lytech_core::domain::registry_config::RegistryConfigManifest;
use lytech_core::domain::technology::Technology;
use lytech_core::infrastructure::technology_xml::TechnologyXml;
use lytech_core::infrastructure::xml_tree::XmlStyle;

#[derive(Subcommand)]
pub enum TechCommand {
    /// List technologies found in the configured directories
    List,

    /// Show one technology
    Show {
        /// Technology name
        name: String,

        /// Print the technology as XML
        #[arg(long)]
        xml: bool,
    },

    /// Export all technologies as one XML document
    Export {
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check that a technology file can be loaded
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Import a technologies document into the configured registry
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the resulting registry to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

pub fn handle_command(command: TechCommand, config: &RegistryConfigManifest) -> Result<()> {
    match command {
        TechCommand::List => list(config),
        TechCommand::Show { name, xml } => show(config, &name, xml),
        TechCommand::Export { output } => export(config, output),
        TechCommand::Validate { file } => validate(&file),
        TechCommand::Import { file, output } => import(config, &file, output),
    }
}

fn open_registry(config: &RegistryConfigManifest) -> Result<TechnologyRegistry> {
    let registry = TechnologyRegistry::from_config(config);
    let report = registry.load_paths(&config.spec.technology_paths);
    print_rejected(&report);
    Ok(registry)
}

fn print_rejected(report: &ImportReport) {
    for rejected in &report.rejected {
        eprintln!(
            "{}",
            format!("⚠ Skipped {}: {}", rejected.source, rejected.error).yellow()
        );
    }
}

fn list(config: &RegistryConfigManifest) -> Result<()> {
    let registry = open_registry(config)?;
    let technologies = registry.snapshot();

    if technologies.is_empty() {
        println!("{}", "No technologies found".yellow());
        return Ok(());
    }

    println!("{} technologies found:", technologies.len());
    println!("{:<24} {:<16} {:<10} {}", "NAME", "GROUP", "DBU", "DESCRIPTION");
    for tech in &technologies {
        println!(
            "{:<24} {:<16} {:<10} {}",
            tech.name().bold(),
            tech.group(),
            tech.dbu(),
            tech.description()
        );
    }

    Ok(())
}

fn show(config: &RegistryConfigManifest, name: &str, as_xml: bool) -> Result<()> {
    let registry = open_registry(config)?;
    let handle = registry
        .lookup(name)
        .ok_or_else(|| anyhow::anyhow!("Technology not found: {}", name))?;
    let tech = handle.read().clone();

    if as_xml {
        let xml = TechnologyXml::new(registry.codecs().clone()).write_technology(&tech, XmlStyle::Pretty)?;
        print!("{}", xml);
        return Ok(());
    }

    print_technology(&tech);
    Ok(())
}

fn print_technology(tech: &Technology) {
    println!("{}", tech.name().bold());
    println!("  Description: {}", tech.description());
    println!("  Group: {}", tech.group());
    println!("  DBU: {}", tech.dbu());
    println!("  Default grids: {}", tech.default_grids());
    println!("  Base path: {}", tech.base_path());
    if !tech.layer_properties_file().is_empty() {
        println!("  Layer properties: {}", tech.eff_layer_properties_file());
    }
    println!("  Add other layers: {}", tech.add_other_layers());
    if !tech.tech_file_path().is_empty() {
        println!("  Loaded from: {}", tech.tech_file_path());
    }

    let components = tech.component_names();
    if !components.is_empty() {
        println!("  Components:");
        for component in tech.components() {
            println!("    - {} ({})", component.name(), component.description());
        }
    }
}

fn export(config: &RegistryConfigManifest, output: Option<PathBuf>) -> Result<()> {
    let registry = open_registry(config)?;
    let xml = registry.export_all_xml()?;

    match output {
        Some(path) => {
            std::fs::write(&path, xml).with_context(|| format!("Failed to write {:?}", path))?;
            println!(
                "{}",
                format!("✓ Exported {} technologies to {}", registry.len(), path.display()).green()
            );
        }
        None => println!("{}", xml),
    }

    Ok(())
}

fn validate(file: &Path) -> Result<()> {
    println!("Validating technology file {}...", file.display());

    let tech = TechnologyXml::default()
        .load_file(file)
        .with_context(|| format!("Technology file {:?} is invalid", file))?;

    println!(
        "{}",
        format!("✓ Technology '{}' is valid", tech.name()).green()
    );
    Ok(())
}

fn import(config: &RegistryConfigManifest, file: &Path, output: Option<PathBuf>) -> Result<()> {
    let registry = open_registry(config)?;
    let xml = std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let report = registry
        .import_all_xml(&xml)
        .with_context(|| format!("Failed to import {:?}", file))?;

    for name in &report.imported {
        println!("{}", format!("✓ Imported {}", name).green());
    }
    for name in &report.replaced {
        println!("{}", format!("✓ Replaced {}", name).green());
    }
    print_rejected(&report);
    println!(
        "{} imported, {} replaced, {} rejected",
        report.imported.len(),
        report.replaced.len(),
        report.rejected.len()
    );

    if let Some(path) = output {
        std::fs::write(&path, registry.export_all_xml()?)
            .with_context(|| format!("Failed to write {:?}", path))?;
        println!("Registry written to {}", path.display());
    }

    Ok(())
}
