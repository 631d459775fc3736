//! Command line argument parsing and validation.

use crate::config::DEFAULT_CONFIG_FILE;
use crate::invoke::DEFAULT_EVENT_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Package a project and deploy it to AWS Lambda
#[derive(Parser, Debug)]
#[command(
    name = "lambda_deploy",
    version,
    about = "Package a project and deploy it to AWS Lambda",
    long_about = "Bundle a project directory into a zip archive or container image and
create or update the AWS Lambda function described by its config.yaml.

Usage:
  lambda_deploy init my_function
  lambda_deploy deploy my_function
  lambda_deploy deploy-s3 my_function --requirements my_function/requirements.txt
  lambda_deploy build-image . && lambda_deploy tag-image . && lambda_deploy push-image .
  lambda_deploy deploy-image . --image-tag v2"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Print detailed progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Project location and config selection shared by most commands
#[derive(clap::Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory containing the config file and handler
    #[arg(index = 1, value_name = "SRC", default_value = ".")]
    pub src: PathBuf,

    /// Config file name inside the project directory
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,

    /// AWS profile (overrides the config file)
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,
}

/// Bundle build options
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Install only the packages listed in this requirements file
    #[arg(long, value_name = "FILE")]
    pub requirements: Option<PathBuf>,

    /// Local package to install into the bundle (repeatable)
    #[arg(long = "local-package", value_name = "PATH")]
    pub local_packages: Vec<String>,

    /// Python interpreter used for pip
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Bundle project files only, without installing dependencies
    #[arg(long)]
    pub no_deps: bool,
}

/// Image selection for image deploys and pushes
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ImageArgs {
    /// Full image URI (overrides lambda_image_uri)
    #[arg(long)]
    pub image_uri: Option<String>,

    /// Image tag appended to the ECR URI (overrides lambda_image_tag)
    #[arg(long)]
    pub image_tag: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new function project from the template
    Init {
        /// Directory to write the template into
        #[arg(default_value = ".")]
        folder: PathBuf,

        /// Leave out the sample event.json
        #[arg(long)]
        minimal: bool,

        /// Function name written into config.yaml
        #[arg(long)]
        name: Option<String>,

        /// Runtime written into config.yaml
        #[arg(long)]
        runtime: Option<String>,
    },

    /// Build the zip bundle into the dist directory
    Build {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
        /// Bundle build options
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Build and deploy the zip bundle
    Deploy {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
        /// Bundle build options
        #[command(flatten)]
        build: BuildArgs,
        /// Keep the function's current VPC attachment
        #[arg(long)]
        preserve_vpc: bool,
    },

    /// Build, stage in S3, and deploy from the staged object
    DeployS3 {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
        /// Bundle build options
        #[command(flatten)]
        build: BuildArgs,
        /// Keep the function's current VPC attachment
        #[arg(long)]
        preserve_vpc: bool,
    },

    /// Build and stage the zip bundle in S3 without deploying
    Upload {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
        /// Bundle build options
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Point an existing function at a container image
    DeployImage {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
        /// Image selection
        #[command(flatten)]
        image: ImageArgs,
        /// Keep the function's current VPC attachment
        #[arg(long)]
        preserve_vpc: bool,
    },

    /// Run the handler with an event
    Invoke {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,

        /// Event file inside the project directory
        #[arg(long, default_value = DEFAULT_EVENT_FILE)]
        event_file: PathBuf,

        /// Invoke the deployed function instead of the local handler
        #[arg(long)]
        remote: bool,

        /// Python interpreter for local invocation
        #[arg(long, value_name = "PATH")]
        python: Option<PathBuf>,
    },

    /// Delete old published versions
    Cleanup {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,

        /// Number of recent versions to keep
        #[arg(long, allow_negative_numbers = true)]
        keep_last: i64,
    },

    /// Build the container image with docker buildx
    BuildImage {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Tag the local image with the ECR URI
    TagImage {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,

        /// Local image (defaults to the --tag build variable)
        #[arg(long)]
        local_image: Option<String>,

        /// Image tag appended to the ECR URI
        #[arg(long)]
        image_tag: Option<String>,
    },

    /// Push the image to its registry
    PushImage {
        /// Project location and config
        #[command(flatten)]
        project: ProjectArgs,
        /// Image selection
        #[command(flatten)]
        image: ImageArgs,
    },
}

impl Command {
    /// Command name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::Build { .. } => "build",
            Command::Deploy { .. } => "deploy",
            Command::DeployS3 { .. } => "deploy-s3",
            Command::Upload { .. } => "upload",
            Command::DeployImage { .. } => "deploy-image",
            Command::Invoke { .. } => "invoke",
            Command::Cleanup { .. } => "cleanup",
            Command::BuildImage { .. } => "build-image",
            Command::TagImage { .. } => "tag-image",
            Command::PushImage { .. } => "push-image",
        }
    }

    /// Project arguments, for commands that operate on a project
    pub fn project(&self) -> Option<&ProjectArgs> {
        match self {
            Command::Init { .. } => None,
            Command::Build { project, .. }
            | Command::Deploy { project, .. }
            | Command::DeployS3 { project, .. }
            | Command::Upload { project, .. }
            | Command::DeployImage { project, .. }
            | Command::Invoke { project, .. }
            | Command::Cleanup { project, .. }
            | Command::BuildImage { project }
            | Command::TagImage { project, .. }
            | Command::PushImage { project, .. } => Some(project),
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(project) = self.command.project() {
            if project.config_file.is_empty() {
                return Err("--config-file must not be empty".to_string());
            }
            if !project.src.is_dir() {
                return Err(format!(
                    "Project directory {} does not exist",
                    project.src.display()
                ));
            }
        }
        if let Command::Init { name: Some(name), .. } = &self.command
            && name.trim().is_empty()
        {
            return Err("--name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print message only in verbose mode
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print progress message
    pub fn progress(&self, message: &str) {
        let _ = self.output.progress(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }
}
