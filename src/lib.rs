//! # lambda_deploy
//!
//! Package a project directory and deploy it to AWS Lambda.
//!
//! A project is a directory with a `config.yaml` describing the function,
//! a handler module, and optionally a requirements file and extra source
//! directories. This crate turns it into either a zip bundle or a
//! container image and creates or updates the function.
//!
//! ## Usage
//!
//! ```bash
//! lambda_deploy init my_function           # scaffold a project
//! lambda_deploy invoke my_function -v      # run the handler locally
//! lambda_deploy deploy my_function         # bundle and deploy inline
//! lambda_deploy deploy-s3 my_function      # bundle, stage in S3, deploy
//! lambda_deploy deploy-image my_function   # point at a pushed image
//! lambda_deploy cleanup my_function --keep-last 5
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod aws;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod image;
pub mod init;
pub mod invoke;

pub use bundle::{BuildOptions, BundleArtifact};
pub use cli::Args;
pub use config::FunctionConfig;
pub use deploy::{DeployOutcome, Deployer, WaitPolicy};
pub use error::{DeployError, Result};
