//! Discovers deployable (app, build, environment) combinations by
//! correlating the configured app specs against the on-disk staging layout.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fleetdeploy_protocol::{AppBuildGroup, AppExecutableSpec, BuildVariant, SpecSet};
use tracing::warn;

use crate::layout::StagingLayout;

/// Inventory keeps only the most recent builds per app.
pub const MAX_VARIANTS: usize = 10;

/// Builds the full inventory: one group per configured app whose product
/// directory exists, alphabetical by app name, variants newest first.
///
/// Every call is a fresh filesystem snapshot. Per-app and per-directory
/// failures are logged and degrade to zero variants for the affected unit;
/// they never abort the whole scan.
pub fn build_inventory(staging: &StagingLayout, specs: &SpecSet) -> Vec<AppBuildGroup> {
    let mut sorted: Vec<&AppExecutableSpec> = specs.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut groups = Vec::new();
    for spec in sorted {
        let product = staging.product_dir(spec);
        if !product.is_dir() {
            warn!(
                app = %spec.name,
                path = %product.display(),
                "product directory missing, skipping app"
            );
            continue;
        }
        groups.push(AppBuildGroup {
            app: spec.name.clone(),
            variants: variants_for(staging, spec, &product),
        });
    }
    groups
}

fn variants_for(
    staging: &StagingLayout,
    spec: &AppExecutableSpec,
    product: &Path,
) -> Vec<BuildVariant> {
    let mut dated: Vec<(BuildVariant, SystemTime)> = if spec.requires_environment {
        packaged_variants(spec, product)
    } else {
        build_dir_variants(staging, spec, product)
    };

    // Newest first by the discovery path's creation time.
    dated.sort_by(|a, b| b.1.cmp(&a.1));
    dated.truncate(MAX_VARIANTS);
    dated.into_iter().map(|(v, _)| v).collect()
}

/// Packaged-artifact layout: `product/environment/build.<ext>`.
fn packaged_variants(
    spec: &AppExecutableSpec,
    product: &Path,
) -> Vec<(BuildVariant, SystemTime)> {
    let Some(ext) = spec.executable_extension() else {
        warn!(app = %spec.name, executable = %spec.executable, "executable has no extension");
        return Vec::new();
    };

    let mut found = Vec::new();
    for env_dir in subdirs(product) {
        let Some(env) = dir_name(&env_dir) else {
            continue;
        };
        for file in files_with_extension(&env_dir, ext) {
            let Some(build) = file.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let timestamp = created(&file);
            found.push((
                BuildVariant {
                    build,
                    environment: Some(env.clone()),
                },
                timestamp,
            ));
        }
    }
    found
}

/// Build-directory layout: `product/build[/subFolder][/environment]/executable`.
fn build_dir_variants(
    staging: &StagingLayout,
    spec: &AppExecutableSpec,
    product: &Path,
) -> Vec<(BuildVariant, SystemTime)> {
    let mut found = Vec::new();
    for build_path in subdirs(product) {
        let Some(build) = dir_name(&build_path) else {
            continue;
        };
        let candidate = staging.build_dir(spec, &build);

        if candidate.join(&spec.executable).is_file() {
            found.push((
                BuildVariant {
                    build,
                    environment: None,
                },
                created(&build_path),
            ));
            continue;
        }

        for env_dir in subdirs(&candidate) {
            if !env_dir.join(&spec.executable).is_file() {
                continue;
            }
            let Some(env) = dir_name(&env_dir) else {
                continue;
            };
            found.push((
                BuildVariant {
                    build: build.clone(),
                    environment: Some(env),
                },
                created(&env_dir),
            ));
        }
    }
    found
}

/// Subdirectories of `path`. Enumeration failures are logged and yield an
/// empty list (zero variants for that unit).
fn subdirs(path: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to enumerate directory");
            return Vec::new();
        }
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect()
}

fn files_with_extension(path: &Path, ext: &str) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to enumerate directory");
            return Vec::new();
        }
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        })
        .collect()
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Creation time of the discovery path, falling back to mtime where the
/// filesystem does not record birth times.
fn created(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetdeploy_protocol::SpecSet;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn spec(name: &str, exe: &str, group: &str) -> AppExecutableSpec {
        AppExecutableSpec {
            name: name.into(),
            executable: exe.into(),
            sub_folder: String::new(),
            product_group: group.into(),
            requires_environment: false,
            env_in_shortcut: false,
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"X").unwrap();
    }

    #[test]
    fn neutral_build_yields_env_none_variant() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Trading/1.0/AppA.exe"));

        let staging = StagingLayout::new(tmp.path());
        let specs = SpecSet::new(vec![spec("AppA", "AppA.exe", "Trading")]);
        let groups = build_inventory(&staging, &specs);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].variants,
            vec![BuildVariant {
                build: "1.0".into(),
                environment: None
            }]
        );
    }

    #[test]
    fn env_subdirs_yield_one_variant_each() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Trading/1.0/Dev/AppA.exe"));
        touch(&tmp.path().join("Trading/1.0/QA/AppA.exe"));
        // A directory without the executable yields nothing.
        fs::create_dir_all(tmp.path().join("Trading/1.0/Stage")).unwrap();

        let staging = StagingLayout::new(tmp.path());
        let specs = SpecSet::new(vec![spec("AppA", "AppA.exe", "Trading")]);
        let groups = build_inventory(&staging, &specs);

        let mut envs: Vec<Option<String>> = groups[0]
            .variants
            .iter()
            .map(|v| v.environment.clone())
            .collect();
        envs.sort();
        assert_eq!(envs, vec![Some("Dev".into()), Some("QA".into())]);
        assert!(groups[0].variants.iter().all(|v| v.build == "1.0"));
    }

    #[test]
    fn neutral_exe_shadows_env_subdirs() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Trading/1.0/AppA.exe"));
        touch(&tmp.path().join("Trading/1.0/Dev/AppA.exe"));

        let staging = StagingLayout::new(tmp.path());
        let specs = SpecSet::new(vec![spec("AppA", "AppA.exe", "Trading")]);
        let groups = build_inventory(&staging, &specs);

        assert_eq!(groups[0].variants.len(), 1);
        assert_eq!(groups[0].variants[0].environment, None);
    }

    #[test]
    fn sub_folder_is_honored() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Trading/1.0/bin/AppA.exe"));
        // Executable outside the subfolder is not a variant.
        touch(&tmp.path().join("Trading/2.0/AppA.exe"));

        let staging = StagingLayout::new(tmp.path());
        let mut s = spec("AppA", "AppA.exe", "Trading");
        s.sub_folder = "bin".into();
        let groups = build_inventory(&staging, &SpecSet::new(vec![s]));

        assert_eq!(groups[0].variants.len(), 1);
        assert_eq!(groups[0].variants[0].build, "1.0");
    }

    #[test]
    fn packaged_layout_uses_file_stem_as_build() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Packages/Dev/1.4.2.msix"));
        touch(&tmp.path().join("Packages/Dev/notes.txt"));
        touch(&tmp.path().join("Packages/QA/1.4.1.msix"));

        let staging = StagingLayout::new(tmp.path());
        let mut s = spec("Installer", "Installer.msix", "Packages");
        s.requires_environment = true;
        let groups = build_inventory(&staging, &SpecSet::new(vec![s]));

        let mut variants = groups[0].variants.clone();
        variants.sort_by(|a, b| a.build.cmp(&b.build));
        assert_eq!(
            variants,
            vec![
                BuildVariant {
                    build: "1.4.1".into(),
                    environment: Some("QA".into())
                },
                BuildVariant {
                    build: "1.4.2".into(),
                    environment: Some("Dev".into())
                },
            ]
        );
    }

    #[test]
    fn missing_product_dir_skips_app() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Trading/1.0/AppA.exe"));

        let staging = StagingLayout::new(tmp.path());
        let specs = SpecSet::new(vec![
            spec("AppA", "AppA.exe", "Trading"),
            spec("Ghost", "Ghost.exe", "NoSuchGroup"),
        ]);
        let groups = build_inventory(&staging, &specs);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].app, "AppA");
    }

    #[test]
    fn groups_are_alphabetical_by_app() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("G/1.0/Zeta.exe"));
        touch(&tmp.path().join("G/1.0/Alpha.exe"));

        let staging = StagingLayout::new(tmp.path());
        let specs = SpecSet::new(vec![
            spec("Zeta", "Zeta.exe", "G"),
            spec("Alpha", "Alpha.exe", "G"),
        ]);
        let groups = build_inventory(&staging, &specs);

        let names: Vec<&str> = groups.iter().map(|g| g.app.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn variants_are_capped_and_newest_first() {
        let tmp = TempDir::new().unwrap();
        for i in 0..12 {
            touch(&tmp.path().join(format!("Trading/{i}.0/AppA.exe")));
            // Give creation timestamps a visible ordering.
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        let staging = StagingLayout::new(tmp.path());
        let specs = SpecSet::new(vec![spec("AppA", "AppA.exe", "Trading")]);
        let groups = build_inventory(&staging, &specs);

        let variants = &groups[0].variants;
        assert_eq!(variants.len(), MAX_VARIANTS);
        // The oldest two builds fell off the end.
        assert!(variants.iter().all(|v| v.build != "0.0" && v.build != "1.0"));
        assert_eq!(variants[0].build, "11.0");
    }

    #[test]
    fn discovered_executables_exist_on_disk() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Trading/1.0/AppA.exe"));
        touch(&tmp.path().join("Trading/2.0/Dev/AppA.exe"));

        let staging = StagingLayout::new(tmp.path());
        let s = spec("AppA", "AppA.exe", "Trading");
        let groups = build_inventory(&staging, &SpecSet::new(vec![s.clone()]));

        for variant in &groups[0].variants {
            let source = staging
                .source_path(&s, &variant.build, variant.environment.as_deref())
                .unwrap();
            assert!(
                source.join(&s.executable).is_file(),
                "executable missing under {source:?}"
            );
        }
    }
}
