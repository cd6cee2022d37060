//! `reqsync requirements`: install and validate requirements per interpreter.
//!
//! A context is either *final* (its freeze directory is populated, and each
//! interpreter installs exactly its frozen `<version>.txt`) or *unfrozen*
//! (every requirements file is installed under `constraints.txt`).

use std::path::{Path, PathBuf};

use reqsync_core::{
    layout::{self, FilesLayout},
    PythonVersion, SupportedPythons,
};

use crate::display;
use crate::error::{io_err, ContainerError};
use crate::pip::{Pip, Python};
use crate::prebuild;
use crate::runner::CommandRunner;

const UNFROZEN_CONSTRAINTS: &str = "constraints.txt";

/// Where an interpreter's requirement files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSource {
    pub dir: PathBuf,
    pub frozen: bool,
}

impl RequirementSource {
    pub fn for_context(files: &FilesLayout, context: &str) -> Result<Self, ContainerError> {
        let freeze_dir = files.freeze_dir(context);
        if layout::has_visible_entries(&freeze_dir)? {
            Ok(Self {
                dir: freeze_dir,
                frozen: true,
            })
        } else {
            Ok(Self {
                dir: files.requirements_dir(context),
                frozen: false,
            })
        }
    }
}

/// Requirement files (relative to the source dir) and their constraints file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSet {
    pub requirements: Vec<String>,
    pub constraints: String,
}

/// Pick the files `version` installs from `source`.
///
/// Interpreters older than `controller_min` only get `ansible-test.*` and
/// `units.*` files.
pub fn select_requirements(
    source: &RequirementSource,
    version: PythonVersion,
    controller_min: PythonVersion,
) -> Result<RequirementSet, ContainerError> {
    if source.frozen {
        let frozen = format!("{version}.txt");
        return Ok(RequirementSet {
            requirements: vec![frozen.clone()],
            constraints: frozen,
        });
    }

    let mut names: Vec<String> = std::fs::read_dir(&source.dir)
        .map_err(|e| io_err(&source.dir, e))?
        .map(|entry| {
            entry
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .map_err(|e| io_err(&source.dir, e))
        })
        .collect::<Result<_, _>>()?;
    names.sort();

    let requirements = names
        .into_iter()
        .filter(|name| name.ends_with(".txt") && name != UNFROZEN_CONSTRAINTS)
        .filter(|name| {
            version >= controller_min
                || name.starts_with("ansible-test.")
                || name.starts_with("units.")
        })
        .collect();

    Ok(RequirementSet {
        requirements,
        constraints: UNFROZEN_CONSTRAINTS.to_string(),
    })
}

/// Supported interpreters present on `PATH`, ascending by version.
pub fn discover_pythons(supported: &SupportedPythons) -> Vec<Python> {
    supported
        .all()
        .into_iter()
        .filter_map(|version| match which::which(version.binary_name()) {
            Ok(path) => Some(Python { version, path }),
            Err(_) => {
                tracing::debug!("{} not found", version.binary_name());
                None
            }
        })
        .collect()
}

/// Set up every interpreter in `pythons` for `context`.
pub fn install_all<R: CommandRunner + ?Sized>(
    runner: &R,
    files: &FilesLayout,
    context: &str,
    pythons: &[Python],
    controller_min: PythonVersion,
) -> Result<(), ContainerError> {
    let source = RequirementSource::for_context(files, context)?;

    display::section("Setting up Python requirements");
    display::info(&format!(
        "Python {controller_min} is the minimum version supported by the Ansible controller."
    ));

    for python in pythons {
        setup_python(runner, files, python, &source, controller_min)?;
    }
    Ok(())
}

/// Install, cross-check and validate requirements for one interpreter.
pub fn setup_python<R: CommandRunner + ?Sized>(
    runner: &R,
    files: &FilesLayout,
    python: &Python,
    source: &RequirementSource,
    controller_min: PythonVersion,
) -> Result<(), ContainerError> {
    let version = python.version;
    display::section(&format!("Started setup of Python {version}"));
    display::info(&python.path.display().to_string());

    display::section(&format!(
        "Finding requirements and constraints for Python {version}"
    ));
    display::info(&source.dir.display().to_string());
    let set = select_requirements(source, version, controller_min)?;
    let constraints = source.dir.join(&set.constraints);

    let pip = Pip::new(runner, python);

    for pre_build in prebuild::load(&files.pre_build_path(version))? {
        display::section(&format!(
            "Pre-building a wheel for Python {version} ({})",
            pre_build.requirement
        ));
        pre_build.execute(&pip)?;
    }

    for requirements in &set.requirements {
        display::section(&format!(
            "Installing requirements for Python {version} ({requirements})"
        ));
        pip.install_requirements(&source.dir.join(requirements), &constraints)?;
    }

    if set.requirements.len() > 1 {
        check_conflicts(&pip, version, &source.dir, &set.requirements, &constraints)?;
    }

    display::section(&format!("Checking pip integrity for Python {version}"));
    pip.check()?;

    display::section(&format!(
        "Checking PyYAML for libyaml support for Python {version}"
    ));
    let libyaml = runner.run(
        &python
            .command()
            .args(["-c", "from yaml import CLoader"])
            .captured(),
    )?;
    if !libyaml.success() {
        display::error("PyYAML was not compiled with libyaml support.");
        return Err(ContainerError::MissingLibyaml { python: version });
    }

    display::section(&format!(
        "Checking coverage C extension support for Python {version}"
    ));
    let coverage = runner.run_checked(
        &python
            .command()
            .args(["-m", "coverage", "--version"])
            .captured(),
    )?;
    if !coverage.stdout.contains("with C extension") {
        display::error(&format!(
            "The coverage module does not have a working C extension:\n{}",
            coverage.stdout
        ));
        return Err(ContainerError::MissingCoverageExtension {
            python: version,
            output: coverage.stdout,
        });
    }

    display::section(&format!("Listing installed packages for Python {version}"));
    for package in pip.list()? {
        display::info(&package.to_string());
    }

    display::section(&format!("Completed setup of Python {version}"));
    pip.purge_cache()
}

/// Re-install each file in turn; the package set must not move.
fn check_conflicts<R: CommandRunner + ?Sized>(
    pip: &Pip<'_, R>,
    version: PythonVersion,
    dir: &Path,
    requirements: &[String],
    constraints: &Path,
) -> Result<(), ContainerError> {
    display::section(&format!(
        "Checking for requirements conflicts for Python {version}"
    ));
    let expected = pip.list()?;

    for requirement in requirements {
        pip.install_requirements(&dir.join(requirement), constraints)?;
        let actual = pip.list()?;
        if actual == expected {
            continue;
        }

        display::error(&format!(
            "Conflicts detected in requirements for Python {version} ({requirement})"
        ));
        display::error(">>> Expected");
        for package in &expected {
            display::error(&package.to_string());
        }
        display::error(">>> Actual");
        for package in &actual {
            display::error(&package.to_string());
        }

        return Err(ContainerError::Conflict {
            python: version,
            requirements: requirement.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::*;
    use crate::runner::CommandOutput;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    const V39: PythonVersion = PythonVersion::new(3, 9);
    const V312: PythonVersion = PythonVersion::new(3, 12);

    fn unfrozen_context() -> (TempDir, FilesLayout) {
        let base = TempDir::new().unwrap();
        let files = FilesLayout::at(base.path());
        fs::create_dir_all(files.freeze_dir("default")).unwrap();
        fs::write(files.freeze_dir("default").join(".freeze.txt"), "").unwrap();
        let req = files.requirements_dir("default");
        fs::create_dir_all(&req).unwrap();
        for name in [
            "ansible-test.txt",
            "ansible.txt",
            "constants.py",
            "constraints.txt",
            "units.txt",
            "integration.cloud.aws.txt",
        ] {
            fs::write(req.join(name), "").unwrap();
        }
        (base, files)
    }

    fn python(version: PythonVersion) -> Python {
        Python {
            version,
            path: PathBuf::from(format!("/usr/bin/python{version}")),
        }
    }

    const PACKAGES: &str = r#"[{"name": "PyYAML", "version": "6.0.2"}]"#;

    fn healthy_runner() -> FakeRunner {
        FakeRunner::new()
            .on("list --format json", ok(PACKAGES))
            .on(
                "coverage --version",
                ok("Coverage.py, version 7.6.1 with C extension\n"),
            )
    }

    #[test]
    fn controller_versions_get_every_requirements_file() {
        let (_base, files) = unfrozen_context();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        assert!(!source.frozen);

        let set = select_requirements(&source, V312, V312).unwrap();
        assert_eq!(
            set.requirements,
            [
                "ansible-test.txt",
                "ansible.txt",
                "integration.cloud.aws.txt",
                "units.txt"
            ]
        );
        assert_eq!(set.constraints, "constraints.txt");
    }

    #[test]
    fn remote_only_versions_get_test_and_units_files() {
        let (_base, files) = unfrozen_context();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        let set = select_requirements(&source, V39, V312).unwrap();
        assert_eq!(set.requirements, ["ansible-test.txt", "units.txt"]);
    }

    #[test]
    fn frozen_context_installs_version_file_as_its_own_constraints() {
        let (_base, files) = unfrozen_context();
        fs::write(files.freeze_dir("default").join("3.12.txt"), "PyYAML==6.0.2\n").unwrap();

        let source = RequirementSource::for_context(&files, "default").unwrap();
        assert!(source.frozen);
        let set = select_requirements(&source, V312, V312).unwrap();
        assert_eq!(set.requirements, ["3.12.txt"]);
        assert_eq!(set.constraints, "3.12.txt");
    }

    #[test]
    fn healthy_interpreter_completes_setup() {
        let (_base, files) = unfrozen_context();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        let runner = healthy_runner();

        setup_python(&runner, &files, &python(V39), &source, V312).unwrap();

        let calls = runner.rendered_calls();
        let installs = calls.iter().filter(|c| c.contains(" install -r ")).count();
        // two files installed, then each re-installed by the conflict check
        assert_eq!(installs, 4);
        assert!(calls.iter().any(|c| c.ends_with("-m pip --disable-pip-version-check check")));
        assert!(calls.last().unwrap().ends_with("cache purge"));
    }

    /// Returns a different package list after the first `pip list`.
    struct DriftingRunner {
        inner: FakeRunner,
        lists: Cell<usize>,
    }

    impl CommandRunner for DriftingRunner {
        fn run(
            &self,
            spec: &crate::runner::CommandSpec,
        ) -> Result<CommandOutput, ContainerError> {
            if spec.to_string().contains("list --format json") {
                let n = self.lists.get();
                self.lists.set(n + 1);
                let body = if n == 0 {
                    PACKAGES
                } else {
                    r#"[{"name": "PyYAML", "version": "5.4.1"}]"#
                };
                return Ok(ok(body));
            }
            self.inner.run(spec)
        }
    }

    #[test]
    fn drifting_package_set_is_a_conflict() {
        let (_base, files) = unfrozen_context();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        let runner = DriftingRunner {
            inner: healthy_runner(),
            lists: Cell::new(0),
        };

        let err = setup_python(&runner, &files, &python(V312), &source, V312).unwrap_err();

        match err {
            ContainerError::Conflict {
                requirements,
                expected,
                actual,
                ..
            } => {
                assert_eq!(requirements, "ansible-test.txt");
                assert_eq!(expected[0].version, "6.0.2");
                assert_eq!(actual[0].version, "5.4.1");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn missing_libyaml_fails() {
        let (_base, files) = unfrozen_context();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        let runner = FakeRunner::new()
            .on("from yaml import CLoader", failed(1, "ImportError"))
            .on("list --format json", ok(PACKAGES));

        let err = setup_python(&runner, &files, &python(V312), &source, V312).unwrap_err();
        assert!(matches!(err, ContainerError::MissingLibyaml { .. }), "got: {err}");
    }

    #[test]
    fn coverage_without_c_extension_fails() {
        let (_base, files) = unfrozen_context();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        let runner = FakeRunner::new()
            .on("list --format json", ok(PACKAGES))
            .on("coverage --version", ok("Coverage.py, version 7.6.1 without C extension\n"));

        let err = setup_python(&runner, &files, &python(V312), &source, V312).unwrap_err();
        match err {
            ContainerError::MissingCoverageExtension { output, .. } => {
                assert!(output.contains("without C extension"))
            }
            other => panic!("expected coverage failure, got {other:?}"),
        }
    }

    #[test]
    fn pre_build_instructions_run_before_installs() {
        let (_base, files) = unfrozen_context();
        let pre_build = files.pre_build_path(V312);
        fs::create_dir_all(pre_build.parent().unwrap()).unwrap();
        fs::write(
            &pre_build,
            "# pre-build requirement: pyyaml == 6.0.2\n# pre-build constraint: Cython < 3.0\n",
        )
        .unwrap();
        let source = RequirementSource::for_context(&files, "default").unwrap();
        let runner = healthy_runner();

        setup_python(&runner, &files, &python(V312), &source, V312).unwrap();

        let calls = runner.rendered_calls();
        let wheel = calls.iter().position(|c| c.contains(" wheel ")).unwrap();
        let first_install = calls.iter().position(|c| c.contains(" install -r ")).unwrap();
        assert!(wheel < first_install);
    }
}
