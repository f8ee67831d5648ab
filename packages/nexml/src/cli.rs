//! Command-line interface for the NeXML reader.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;

use phylodata_model::DataSet;

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::reader::NexmlReader;

/// Phylodata NeXML reader - inspect phylogenetic data documents.
#[derive(Parser)]
#[command(name = "phylodata-nexml")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a NeXML document and print a summary.
    Inspect {
        /// Path to the NeXML file
        file: PathBuf,

        /// Write a YAML summary to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip character blocks
        #[arg(long)]
        exclude_chars: bool,

        /// Skip tree blocks
        #[arg(long)]
        exclude_trees: bool,

        /// Reject trees with more than one root candidate
        #[arg(long)]
        strict_acyclicity: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            file,
            output,
            exclude_chars,
            exclude_trees,
            strict_acyclicity,
        } => {
            let config = ReaderConfig {
                exclude_chars,
                exclude_trees,
                strict_acyclicity,
                ..ReaderConfig::default()
            };
            inspect_command(&file, output.as_deref(), config)
        }
    }
}

/// YAML-serializable document summary.
#[derive(Debug, Serialize)]
struct DocumentSummary {
    taxon_namespaces: Vec<TaxonNamespaceSummary>,
    char_matrices: Vec<MatrixSummary>,
    tree_lists: Vec<TreeListSummary>,
}

#[derive(Debug, Serialize)]
struct TaxonNamespaceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    taxa: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MatrixSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    data_type: String,
    rows: usize,
    columns: usize,
}

#[derive(Debug, Serialize)]
struct TreeListSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    trees: usize,
    leaves: Vec<usize>,
}

impl DocumentSummary {
    fn from_dataset(dataset: &DataSet) -> Self {
        Self {
            taxon_namespaces: dataset
                .taxon_namespaces
                .iter()
                .map(|namespace| TaxonNamespaceSummary {
                    label: namespace.label.clone(),
                    taxa: namespace.iter().map(|(_, t)| t.label.clone()).collect(),
                })
                .collect(),
            char_matrices: dataset
                .char_matrices
                .iter()
                .map(|matrix| MatrixSummary {
                    label: matrix.label.clone(),
                    data_type: matrix.data_type.as_str().to_string(),
                    rows: matrix.len(),
                    columns: matrix
                        .rows()
                        .iter()
                        .map(|row| row.sequence.len())
                        .max()
                        .unwrap_or(matrix.character_types.len()),
                })
                .collect(),
            tree_lists: dataset
                .tree_lists
                .iter()
                .map(|list| TreeListSummary {
                    label: list.label.clone(),
                    trees: list.trees.len(),
                    leaves: list.trees.iter().map(|t| t.leaves().len()).collect(),
                })
                .collect(),
        }
    }
}

/// Execute the inspect command.
fn inspect_command(file: &Path, output: Option<&Path>, config: ReaderConfig) -> Result<()> {
    let mut reader = NexmlReader::with_config(config);
    let dataset = reader.read_path(file)?;
    let summary = DocumentSummary::from_dataset(&dataset);

    println!("{} {}", style("Document:").bold(), file.display());
    println!(
        "  {} {}",
        style("Taxon namespaces:").cyan(),
        summary.taxon_namespaces.len()
    );
    for namespace in &summary.taxon_namespaces {
        println!(
            "    - {} ({} taxa)",
            namespace.label.as_deref().unwrap_or("<unlabeled>"),
            namespace.taxa.len()
        );
    }
    println!(
        "  {} {}",
        style("Character matrices:").cyan(),
        summary.char_matrices.len()
    );
    for matrix in &summary.char_matrices {
        println!(
            "    - {} [{}]: {} rows x {} columns",
            matrix.label.as_deref().unwrap_or("<unlabeled>"),
            matrix.data_type,
            matrix.rows,
            matrix.columns
        );
    }
    println!(
        "  {} {}",
        style("Tree collections:").cyan(),
        summary.tree_lists.len()
    );
    for list in &summary.tree_lists {
        println!(
            "    - {} ({} trees)",
            list.label.as_deref().unwrap_or("<unlabeled>"),
            list.trees
        );
    }

    if let Some(path) = output {
        let yaml = serde_yaml_ng::to_string(&summary).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, yaml)?;
        println!("{} {}", style("Summary written to").green(), path.display());
    }

    Ok(())
}
