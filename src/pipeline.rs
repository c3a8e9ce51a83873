//! Build and assembly of the deployable output tree.
//!
//! Cleans previous outputs, builds the client and then the server, and copies both into
//! `out/client` and `out/server` together with the server's manifest and lock file. Every step
//! runs to completion before the next starts and the first failure aborts the run.

use log::{error, info};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{step}: {source}")]
    Io {
        step: String,
        #[source]
        source: io::Error,
    },
    #[error("could not start {name} build: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{name} build failed ({status})")]
    StepFailed { name: &'static str, status: String },
    #[error("{0} build command is empty")]
    EmptyCommand(&'static str),
}

fn io_step(step: impl Into<String>) -> impl FnOnce(io::Error) -> BuildError {
    let step = step.into();
    move |source| BuildError::Io { step, source }
}

#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub client_dir: PathBuf,
    pub client_dist: PathBuf,
    pub client_command: Vec<OsString>,
    pub server_command: Vec<OsString>,
    /// Files or directories, relative to `root`, that make up the built server.
    pub server_artifacts: Vec<PathBuf>,
    pub manifest: PathBuf,
    /// Copied when present.
    pub lock_file: PathBuf,
}

impl BuildPlan {
    /// The conventional layout: `client/` built with npm, this crate built with cargo.
    pub fn new(root: impl Into<PathBuf>) -> BuildPlan {
        let root = root.into();
        let client_dir = root.join("client");
        let binary = format!("showcase-server{}", std::env::consts::EXE_SUFFIX);

        BuildPlan {
            out_dir: root.join("out"),
            client_dist: client_dir.join("dist"),
            client_dir,
            client_command: vec!["npm".into(), "run".into(), "build".into()],
            server_command: vec!["cargo".into(), "build".into(), "--release".into()],
            server_artifacts: vec![PathBuf::from("target").join("release").join(binary)],
            manifest: root.join("Cargo.toml"),
            lock_file: root.join("Cargo.lock"),
            root,
        }
    }

    pub fn out_client_dir(&self) -> PathBuf {
        self.out_dir.join("client")
    }

    pub fn out_server_dir(&self) -> PathBuf {
        self.out_dir.join("server")
    }

    pub async fn run(&self) -> Result<(), BuildError> {
        info!("Starting the build process...");

        info!("Cleaning output directory: {}", self.out_dir.display());
        remove_path(&self.out_dir).await?;
        info!("Cleaning client dist directory: {}", self.client_dist.display());
        remove_path(&self.client_dist).await?;
        for artifact in &self.server_artifacts {
            let artifact = self.root.join(artifact);
            info!("Cleaning server artifact: {}", artifact.display());
            remove_path(&artifact).await?;
        }

        fs::create_dir_all(&self.out_dir)
            .await
            .map_err(io_step("create output directory"))?;

        run_command("Client", &self.client_command, &self.client_dir).await?;
        run_command("Server", &self.server_command, &self.root).await?;

        let out_client = self.out_client_dir();
        let out_server = self.out_server_dir();
        fs::create_dir(&out_client)
            .await
            .map_err(io_step("create out/client"))?;
        fs::create_dir(&out_server)
            .await
            .map_err(io_step("create out/server"))?;

        info!(
            "Copying {} to {}...",
            self.client_dist.display(),
            out_client.display()
        );
        let copied = copy_tree(&self.client_dist, &out_client)
            .await
            .map_err(io_step("copy client distribution"))?;
        info!("Client distribution copied ({copied} files).");

        for artifact in &self.server_artifacts {
            let from = self.root.join(artifact);
            let name = artifact.file_name().unwrap_or(artifact.as_os_str());
            copy_path(&from, &out_server.join(name))
                .await
                .map_err(io_step(format!("copy server artifact {}", from.display())))?;
        }
        info!("Server distribution copied.");

        copy_into(&self.manifest, &out_server)
            .await
            .map_err(io_step("copy server manifest"))?;
        match copy_into(&self.lock_file, &out_server).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No lock file found, skipping copy.");
            }
            Err(e) => return Err(io_step("copy server lock file")(e)),
        }
        info!("Server package files copied.");

        info!("Build process completed successfully!");
        info!("Output available in: {}", self.out_dir.display());

        Ok(())
    }
}

async fn run_command(
    name: &'static str,
    command: &[OsString],
    cwd: &Path,
) -> Result<(), BuildError> {
    let (program, args) = command
        .split_first()
        .ok_or(BuildError::EmptyCommand(name))?;

    info!("Running {name} build in {}...", cwd.display());

    let Output {
        status,
        stdout,
        stderr,
    } = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|source| BuildError::Spawn { name, source })?;

    if !stdout.is_empty() {
        info!("stdout:\n{}", String::from_utf8_lossy(&stdout));
    }
    if !stderr.is_empty() {
        error!("stderr:\n{}", String::from_utf8_lossy(&stderr));
    }

    if !status.success() {
        return Err(BuildError::StepFailed {
            name,
            status: status.to_string(),
        });
    }

    info!("{name} build completed successfully.");
    Ok(())
}

/// Removes a file or directory tree; a missing path is not an error.
async fn remove_path(path: &Path) -> Result<(), BuildError> {
    let removed = match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };

    removed.map_err(io_step(format!("clean {}", path.display())))
}

async fn copy_into(file: &Path, dir: &Path) -> io::Result<()> {
    let name = file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    fs::copy(file, dir.join(name)).await.map(|_| ())
}

async fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    if fs::metadata(from).await?.is_dir() {
        copy_tree(from, to).await.map(|_| ())
    } else {
        fs::copy(from, to).await.map(|_| ())
    }
}

/// Copies the contents of `from` into `to`, returning the number of files copied.
async fn copy_tree(from: &Path, to: &Path) -> io::Result<u64> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    let mut copied = 0;

    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst).await?;

        let mut entries = fs::read_dir(&src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = dst.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), &target).await?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
