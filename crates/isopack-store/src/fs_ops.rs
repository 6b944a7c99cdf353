use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use isopack_core::PackageSpec;

use crate::layout::StoreLayout;

/// Write a spec's `pkg.toml` into its package directory, creating the
/// directory if needed.
pub fn write_spec(layout: &StoreLayout, spec: &PackageSpec) -> Result<PathBuf> {
    let package_dir = layout.package_dir(&spec.name, &spec.version.to_string());
    fs::create_dir_all(&package_dir)
        .with_context(|| format!("failed to create package dir: {}", package_dir.display()))?;

    let path = layout.spec_path(&spec.name, &spec.version.to_string());
    fs::write(&path, spec.to_toml_string()?)
        .with_context(|| format!("failed to write package spec: {}", path.display()))?;
    Ok(path)
}

/// Copy a staged package tree into the store, replacing any existing
/// payload for the same name and version, and write the spec file.
pub fn install_tree(layout: &StoreLayout, spec: &PackageSpec, staged: &Path) -> Result<PathBuf> {
    let dst = layout.package_dir(&spec.name, &spec.version.to_string());
    if dst.exists() {
        fs::remove_dir_all(&dst)
            .with_context(|| format!("failed to remove existing package dir: {}", dst.display()))?;
    }

    copy_dir_recursive(staged, &dst)?;
    write_spec(layout, spec)?;
    Ok(dst)
}

/// Remove an installed package's payload directory and, optionally, its
/// exposed executables. The now-empty `pkgs/<name>` parent is pruned.
pub fn uninstall_package(
    layout: &StoreLayout,
    spec: &PackageSpec,
    remove_executables: bool,
) -> Result<()> {
    let package_dir = layout.package_dir(&spec.name, &spec.version.to_string());
    if package_dir.exists() {
        fs::remove_dir_all(&package_dir)
            .with_context(|| format!("failed to remove package dir: {}", package_dir.display()))?;
    }

    if remove_executables {
        for executable in &spec.executables {
            remove_exposed_binary(layout, executable)?;
        }
    }

    let name_dir = layout.name_dir(&spec.name);
    if name_dir.exists() && dir_is_empty(&name_dir)? {
        fs::remove_dir(&name_dir)
            .with_context(|| format!("failed to prune package dir: {}", name_dir.display()))?;
    }

    Ok(())
}

pub fn bin_path(layout: &StoreLayout, binary_name: &str) -> PathBuf {
    let mut file_name = binary_name.to_string();
    if cfg!(windows) {
        file_name.push_str(".cmd");
    }
    layout.bin_dir().join(file_name)
}

pub fn expose_binary(
    layout: &StoreLayout,
    install_root: &Path,
    binary_name: &str,
    binary_rel_path: &str,
) -> Result<()> {
    let source_rel = validated_relative_binary_path(binary_rel_path)?;
    let source_path = install_root.join(source_rel);
    if !source_path.exists() {
        return Err(anyhow!(
            "declared binary path '{}' was not found in install root: {}",
            binary_rel_path,
            source_path.display()
        ));
    }

    fs::create_dir_all(layout.bin_dir())
        .with_context(|| format!("failed to create {}", layout.bin_dir().display()))?;

    let destination = bin_path(layout, binary_name);
    if destination.exists() {
        fs::remove_file(&destination).with_context(|| {
            format!(
                "failed to replace existing binary entry: {}",
                destination.display()
            )
        })?;
    }

    create_binary_entry(&source_path, &destination)
}

pub fn remove_exposed_binary(layout: &StoreLayout, binary_name: &str) -> Result<()> {
    let destination = bin_path(layout, binary_name);
    if !destination.exists() {
        return Ok(());
    }

    fs::remove_file(&destination)
        .with_context(|| format!("failed to remove exposed binary: {}", destination.display()))?;
    Ok(())
}

fn validated_relative_binary_path(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    if relative.is_absolute() {
        return Err(anyhow!("binary path must be relative: {}", path));
    }
    if relative.as_os_str().is_empty() {
        return Err(anyhow!("binary path must not be empty"));
    }
    if relative
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(anyhow!("binary path must not include '..': {}", path));
    }
    Ok(relative)
}

fn create_binary_entry(source_path: &Path, destination: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(source_path, destination).with_context(|| {
            format!(
                "failed to create symlink {} -> {}",
                destination.display(),
                source_path.display()
            )
        })
    }

    #[cfg(windows)]
    {
        let shim = format!("@echo off\r\n\"{}\" %*\r\n", source_path.display());
        fs::write(destination, shim.as_bytes())
            .with_context(|| format!("failed to write shim: {}", destination.display()))
    }
}

fn dir_is_empty(dir: &Path) -> Result<bool> {
    let mut entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    Ok(entries.next().is_none())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&src_path)
            .with_context(|| format!("failed to stat {}", src_path.display()))?;
        if metadata.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
            continue;
        }

        #[cfg(unix)]
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("failed to read symlink {}", src_path.display()))?;
            std::os::unix::fs::symlink(&target, &dst_path).with_context(|| {
                format!(
                    "failed to create symlink {} -> {}",
                    dst_path.display(),
                    target.display()
                )
            })?;
            continue;
        }

        fs::copy(&src_path, &dst_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                src_path.display(),
                dst_path.display()
            )
        })?;
    }
    Ok(())
}
