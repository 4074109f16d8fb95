use crate::constants::{FEATURE_SETS, PACKAGE, TARGETS};
use anyhow::{Context, Result};
use std::process::Command;

pub fn test(features: Option<&str>, filter: Option<&str>) -> Result<()> {
    let mut cargo = cargo("test");
    if let Some(features) = features {
        cargo.args(["--features", features]);
    }
    if let Some(filter) = filter {
        cargo.arg(filter);
    }
    run(cargo, "test")
}

pub fn check_all(target: Option<&str>, release: bool) -> Result<()> {
    let targets: Vec<&str> = match target {
        Some(target) => vec![target],
        None => TARGETS.to_vec(),
    };

    for target in targets {
        for features in FEATURE_SETS {
            println!(
                "Building {} for {} (features: {})...",
                PACKAGE,
                target,
                features.unwrap_or("none")
            );
            check(target, *features, release)?;
        }
    }

    Ok(())
}

fn check(target: &str, features: Option<&str>, release: bool) -> Result<()> {
    let mut cargo = cargo("build");
    cargo.arg("--no-default-features").arg("--target").arg(target);

    if release {
        cargo.arg("--release");
    }

    if let Some(features) = features {
        cargo.args(["--features", features]);
    }

    run(cargo, target)
}

pub fn doc(open: bool) -> Result<()> {
    let mut cargo = cargo("doc");
    cargo.args(["--no-deps", "--features", "defmt"]);
    if open {
        cargo.arg("--open");
    }
    run(cargo, "doc")
}

fn cargo(subcommand: &str) -> Command {
    let mut cargo = Command::new("cargo");
    cargo.arg(subcommand).args(["--package", PACKAGE]);
    cargo
}

fn run(mut cargo: Command, what: &str) -> Result<()> {
    let status = cargo
        .status()
        .with_context(|| format!("Failed to run cargo {} for {}", what, PACKAGE))?;

    if !status.success() {
        anyhow::bail!("cargo {} failed for {}", what, PACKAGE);
    }

    Ok(())
}
