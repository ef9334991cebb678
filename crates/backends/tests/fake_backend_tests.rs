//! Contract tests driven through in-memory fakes.
//!
//! The fakes record every invocation and honor the dry-run contract the
//! way a real backend must: same argv construction, no side effects.

use async_trait::async_trait;
use slipway_backends::{
    CommandResult, DryRun, LogEntry, PackageManager, Result, Vcs,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

fn result_for(argv: Vec<String>, dry_run: DryRun) -> CommandResult {
    CommandResult {
        command: argv,
        return_code: 0,
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::ZERO,
        dry_run: dry_run.is_dry(),
    }
}

#[derive(Default)]
struct FakePackageManager {
    calls: Mutex<Vec<Vec<String>>>,
    published: Mutex<Vec<String>>,
}

impl FakePackageManager {
    fn record(&self, argv: Vec<String>, dry_run: DryRun) -> CommandResult {
        self.calls.lock().unwrap().push(argv.clone());
        result_for(argv, dry_run)
    }
}

#[async_trait]
impl PackageManager for FakePackageManager {
    async fn build(
        &self,
        package_dir: &Path,
        output_dir: &Path,
        no_sources: bool,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let mut argv = vec![
            "uv".to_string(),
            "build".to_string(),
            package_dir.display().to_string(),
            "--out-dir".to_string(),
            output_dir.display().to_string(),
        ];
        if no_sources {
            argv.push("--no-sources".to_string());
        }
        Ok(self.record(argv, dry_run))
    }

    async fn publish(
        &self,
        dist_dir: &Path,
        check_url: Option<&str>,
        index_url: Option<&str>,
        _dist_tag: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let mut argv = vec![
            "uv".to_string(),
            "publish".to_string(),
            dist_dir.display().to_string(),
        ];
        if let Some(url) = check_url {
            argv.extend(["--check-url".to_string(), url.to_string()]);
        }
        if let Some(url) = index_url {
            argv.extend(["--index-url".to_string(), url.to_string()]);
        }
        if !dry_run.is_dry() {
            self.published
                .lock()
                .unwrap()
                .push(dist_dir.display().to_string());
        }
        Ok(self.record(argv, dry_run))
    }

    async fn lock(
        &self,
        check_only: bool,
        upgrade_package: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let mut argv = vec!["uv".to_string(), "lock".to_string()];
        if check_only {
            argv.push("--check".to_string());
        }
        if let Some(package) = upgrade_package {
            argv.extend(["--upgrade-package".to_string(), package.to_string()]);
        }
        Ok(self.record(argv, dry_run))
    }

    async fn version_bump(
        &self,
        package_dir: &Path,
        new_version: &str,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let argv = vec![
            "uv".to_string(),
            "version".to_string(),
            new_version.to_string(),
            "--directory".to_string(),
            package_dir.display().to_string(),
        ];
        Ok(self.record(argv, dry_run))
    }

    async fn resolve_check(
        &self,
        name: &str,
        version: &str,
        _index_url: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let argv = vec![
            "uv".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "--dry-run".to_string(),
            format!("{name}=={version}"),
        ];
        Ok(self.record(argv, dry_run))
    }

    async fn smoke_test(
        &self,
        name: &str,
        version: &str,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let argv = vec![
            "uv".to_string(),
            "run".to_string(),
            "--with".to_string(),
            format!("{name}=={version}"),
            "python".to_string(),
            "-c".to_string(),
            format!("import {name}"),
        ];
        Ok(self.record(argv, dry_run))
    }
}

struct FakeVcs {
    clean: bool,
    entries: Vec<LogEntry>,
    tags: Mutex<Vec<String>>,
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn is_clean(&self) -> Result<bool> {
        Ok(self.clean)
    }

    async fn is_shallow(&self) -> Result<bool> {
        Ok(false)
    }

    async fn current_sha(&self) -> Result<String> {
        Ok("abc123".to_string())
    }

    async fn log(&self, _range: &str) -> Result<Vec<LogEntry>> {
        Ok(self.entries.clone())
    }

    async fn commit(
        &self,
        message: &str,
        paths: &[PathBuf],
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        let mut argv = vec!["git".to_string(), "commit".to_string(), "-m".to_string()];
        argv.push(message.to_string());
        argv.extend(paths.iter().map(|p| p.display().to_string()));
        Ok(result_for(argv, dry_run))
    }

    async fn tag(&self, name: &str, message: &str, dry_run: DryRun) -> Result<CommandResult> {
        if !dry_run.is_dry() {
            self.tags.lock().unwrap().push(name.to_string());
        }
        let argv = vec![
            "git".to_string(),
            "tag".to_string(),
            "-a".to_string(),
            name.to_string(),
            "-m".to_string(),
            message.to_string(),
        ];
        Ok(result_for(argv, dry_run))
    }

    async fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.lock().unwrap().iter().any(|t| t == name))
    }

    async fn delete_tag(
        &self,
        name: &str,
        remote: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult> {
        if !dry_run.is_dry() {
            self.tags.lock().unwrap().retain(|t| t != name);
        }
        let mut argv = vec!["git".to_string(), "tag".to_string(), "-d".to_string()];
        argv.push(name.to_string());
        if let Some(remote) = remote {
            argv.push(remote.to_string());
        }
        Ok(result_for(argv, dry_run))
    }
}

#[tokio::test]
async fn dry_run_publish_reports_argv_without_side_effects() {
    let pm = FakePackageManager::default();
    let result = pm
        .publish(
            Path::new("dist/core"),
            Some("https://pypi.org/simple"),
            None,
            None,
            DryRun::Yes,
        )
        .await
        .unwrap();

    assert!(result.ok());
    assert!(result.dry_run);
    assert_eq!(result.command[0], "uv");
    assert!(result.command.contains(&"--check-url".to_string()));
    assert!(pm.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn real_publish_has_side_effects() {
    let pm = FakePackageManager::default();
    pm.publish(Path::new("dist/core"), None, None, None, DryRun::No)
        .await
        .unwrap();
    assert_eq!(pm.published.lock().unwrap().as_slice(), ["dist/core"]);
}

#[tokio::test]
async fn build_flags_follow_arguments() {
    let pm = FakePackageManager::default();
    let with_sources = pm
        .build(Path::new("pkgs/a"), Path::new("dist/a"), false, DryRun::Yes)
        .await
        .unwrap();
    let without_sources = pm
        .build(Path::new("pkgs/a"), Path::new("dist/a"), true, DryRun::Yes)
        .await
        .unwrap();

    assert!(!with_sources.command.contains(&"--no-sources".to_string()));
    assert!(without_sources.command.contains(&"--no-sources".to_string()));
}

#[tokio::test]
async fn tag_lifecycle_respects_dry_run() {
    let vcs = FakeVcs {
        clean: true,
        entries: vec![],
        tags: Mutex::new(vec![]),
    };

    vcs.tag("core-v1.1.0", "core 1.1.0", DryRun::Yes).await.unwrap();
    assert!(!vcs.tag_exists("core-v1.1.0").await.unwrap());

    vcs.tag("core-v1.1.0", "core 1.1.0", DryRun::No).await.unwrap();
    assert!(vcs.tag_exists("core-v1.1.0").await.unwrap());

    vcs.delete_tag("core-v1.1.0", None, DryRun::No).await.unwrap();
    assert!(!vcs.tag_exists("core-v1.1.0").await.unwrap());
}

#[tokio::test]
async fn log_entries_carry_changed_files() {
    let vcs = FakeVcs {
        clean: true,
        entries: vec![LogEntry {
            sha: "abc".to_string(),
            message: "feat: new api".to_string(),
            files: vec![PathBuf::from("crates/core/src/lib.rs")],
        }],
        tags: Mutex::new(vec![]),
    };

    let log = vcs.log("v1.0.0..HEAD").await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].files[0], PathBuf::from("crates/core/src/lib.rs"));
}
