// src/commands.rs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::{
    assembler::{self, DocumentAssembler, GenerateOutcome},
    config::{IndexConfig, UnifyConfig, DEFAULT_ARTIFACT_NAME, DEFAULT_FRAMEWORK_INCLUDE, DEFAULT_SENTINEL},
    cpp_index::TreeSitterIndex,
    index::{self, SharedIndex, SnapshotIndex, SourceIndex},
    project::Project,
};

#[derive(Parser, Debug)]
#[command(name = "inoprep", version, about = "Unify Arduino sketch files into one translation unit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write (or remove) the unified source for a sketch project
    Generate(GenerateArgs),
    /// Write the built-in source index as a JSONL snapshot
    DumpIndex(DumpArgs),
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Project directory
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Project name; defaults to the directory name
    #[arg(long)]
    pub name: Option<String>,

    /// Extensions the built-in index treats as C/C++ source
    #[arg(long = "source-ext", value_delimiter = ',')]
    pub source_ext: Option<Vec<String>>,
}

impl ProjectArgs {
    fn index_config(&self) -> IndexConfig {
        match &self.source_ext {
            Some(exts) => IndexConfig { source_extensions: exts.clone() },
            None => IndexConfig::default(),
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Read source facts from a JSONL snapshot instead of parsing
    #[arg(long)]
    pub index: Option<PathBuf>,

    #[arg(long, env = "INOPREP_ARTIFACT", default_value = DEFAULT_ARTIFACT_NAME)]
    pub artifact: String,

    /// Macro guarding the whole generated unit
    #[arg(long, env = "INOPREP_SENTINEL", default_value = DEFAULT_SENTINEL)]
    pub sentinel: String,

    #[arg(long, default_value = DEFAULT_FRAMEWORK_INCLUDE)]
    pub framework_include: String,

    /// Extensions that mark a project member as a sketch
    #[arg(long = "sketch-ext", value_delimiter = ',')]
    pub sketch_ext: Option<Vec<String>>,

    /// Print the unified source instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

impl GenerateArgs {
    fn unify_config(&self) -> UnifyConfig {
        let defaults = UnifyConfig::default();
        UnifyConfig {
            artifact_name: self.artifact.clone(),
            sentinel: self.sentinel.clone(),
            framework_include: self.framework_include.clone(),
            sketch_extensions: self.sketch_ext.clone().unwrap_or(defaults.sketch_extensions),
        }
    }
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output file; defaults to <DIR>/.inoprep/<NAME>.jsonl
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run_cli() -> Result<()> {
    match Cli::parse().command {
        Command::Generate(args) => generate(&args),
        Command::DumpIndex(args) => dump_index(&args),
    }
}

fn open_project(args: &ProjectArgs) -> Result<Project> {
    Project::open(&args.dir, args.name.as_deref())
        .with_context(|| format!("opening project {}", args.dir.display()))
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let project = open_project(&args.project)?;
    let config = args.unify_config();

    match &args.index {
        Some(snapshot) => {
            let idx = SnapshotIndex::load(snapshot)
                .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
            if idx.is_empty() {
                warn!("snapshot {} holds no translation units", snapshot.display());
            } else {
                info!("loaded {} translation units from {}", idx.len(), snapshot.display());
            }
            run_generate(&project, SharedIndex::new(idx), &config, args.stdout)
        }
        None => {
            let idx = TreeSitterIndex::build(&project, &args.project.index_config())
                .context("building source index")?;
            run_generate(&project, SharedIndex::new(idx), &config, args.stdout)
        }
    }
}

fn run_generate<I: SourceIndex>(
    project: &Project,
    index: SharedIndex<I>,
    config: &UnifyConfig,
    to_stdout: bool,
) -> Result<()> {
    if to_stdout {
        let sketches = project.sketch_files(config);
        let assembly = DocumentAssembler::new(config)
            .assemble(&sketches, &index, &chrono::Local::now())
            .context("assembling unified source")?;
        if let assembler::Assembly::Document(doc) = assembly {
            print!("{}", doc.render(&config.sentinel));
        } else {
            eprintln!("No sketch files in {}", project.root.display());
        }
        return Ok(());
    }

    let outcome = assembler::generate(project, &index, config)
        .with_context(|| format!("generating unified source for {}", project.name))?;
    match outcome {
        GenerateOutcome::Written(p) => println!("Unified source written to {}", p.display()),
        GenerateOutcome::Removed(p) => println!("No sketch files left; removed {}", p.display()),
        GenerateOutcome::NothingToDo => println!("No sketch files in {}", project.root.display()),
        GenerateOutcome::Skipped => println!("Source index busy; nothing generated."),
    }
    Ok(())
}

fn dump_index(args: &DumpArgs) -> Result<()> {
    let project = open_project(&args.project)?;
    let idx = TreeSitterIndex::build(&project, &args.project.index_config())
        .context("building source index")?;
    let out = args.out.clone().unwrap_or_else(|| default_snapshot_path(&project));
    index::write_snapshot(idx.units(), &out)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("Index snapshot written to {}", out.display());
    Ok(())
}

fn default_snapshot_path(project: &Project) -> PathBuf {
    snapshot_dir(&project.root).join(format!("{}.jsonl", project.name))
}

fn snapshot_dir(root: &Path) -> PathBuf {
    root.join(".inoprep")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_feed_the_config() {
        let cli = Cli::try_parse_from([
            "inoprep", "generate", "sketches/Blink", "--sentinel", "MY_IDE", "--source-ext", "cpp,h",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else { panic!("expected generate") };
        let config = args.unify_config();
        assert_eq!(config.sentinel, "MY_IDE");
        assert_eq!(config.artifact_name, DEFAULT_ARTIFACT_NAME);
        assert_eq!(config.sketch_extensions, vec!["ino", "pde"]);
        assert_eq!(args.project.dir, PathBuf::from("sketches/Blink"));
        assert!(!args.project.index_config().is_source_extension("ino"));
    }

    #[test]
    fn sketch_extensions_come_from_the_flag() {
        let cli = Cli::try_parse_from(["inoprep", "generate", "--sketch-ext", "ino,sketch"]).unwrap();
        let Command::Generate(args) = cli.command else { panic!("expected generate") };
        let config = args.unify_config();
        assert!(config.is_sketch_extension("sketch"));
        assert!(!config.is_sketch_extension("pde"));
    }

    #[test]
    fn snapshot_defaults_under_project_root() {
        let project = Project { name: "Blink".into(), root: PathBuf::from("/p/Blink"), members: vec![] };
        assert_eq!(default_snapshot_path(&project), PathBuf::from("/p/Blink/.inoprep/Blink.jsonl"));
    }
}
