use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tfvc::adapters::{StdLocalItems, TomlWorkspaceStore};
use tfvc::services::{CommandContext, CommandOptions, Connector, Console};
use tfvc_core::app::ExitCode;
use tfvc_core::domain::change::ChangeType;
use tfvc_core::domain::item::{PendingChange, WorkingFolder, WorkspaceInfo};
use tfvc_core::ports::PendingChangeSource;

const COLLECTION: &str = "http://tfs:8080/tfs/DefaultCollection";

struct Fixture {
    _temp_dir: TempDir,
    store: Arc<TomlWorkspaceStore>,
    workspace: WorkspaceInfo,
    local_root: PathBuf,
}

impl Fixture {
    /// A workspace mapping `$/proj` to `<tmp>/proj` with files on disk for
    /// every pending change.
    fn new(names: &[&str]) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let local_root = temp_dir.path().join("proj");
        fs::create_dir_all(&local_root)?;

        let workspace = WorkspaceInfo {
            name: "dev".to_string(),
            owner: "alice".to_string(),
            computer: "box".to_string(),
            server_uri: COLLECTION.to_string(),
            comment: None,
            working_folders: vec![WorkingFolder {
                server_item: "$/proj".to_string(),
                local_item: local_root.clone(),
                cloaked: false,
            }],
        };

        let mut pending = Vec::new();
        for name in names {
            let local = local_root.join(name);
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&local, name)?;
            pending.push(PendingChange::new(format!("$/proj/{}", name), ChangeType::EDIT).with_local_item(local));
        }

        let store = Arc::new(TomlWorkspaceStore::new(temp_dir.path().join("cache")));
        store.save(&workspace, &pending)?;

        Ok(Self {
            _temp_dir: temp_dir,
            store,
            workspace,
            local_root,
        })
    }

    fn context(&self, cwd: &Path, options: CommandOptions) -> CommandContext {
        let root = self.store.root().to_path_buf();
        let connector: Connector = Box::new(move |_: &str| -> Result<Box<dyn PendingChangeSource>> {
            Ok(Box::new(TomlWorkspaceStore::new(&root)))
        });
        CommandContext::new(
            self.store.clone(),
            Arc::new(StdLocalItems::new()),
            connector,
            cwd,
            options,
        )
    }

    fn remaining(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .pending_changes(&self.workspace)?
            .into_iter()
            .map(|c| c.server_item)
            .collect())
    }
}

fn options() -> CommandOptions {
    CommandOptions {
        show_summary: true,
        ..CommandOptions::default()
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

struct Output {
    code: ExitCode,
    out: String,
    err: String,
}

fn capture<F>(f: F) -> Result<Output>
where
    F: FnOnce(&mut Console<'_>) -> Result<ExitCode>,
{
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = f(&mut Console {
        out: &mut out,
        err: &mut err,
    })?;
    Ok(Output {
        code,
        out: String::from_utf8(out)?,
        err: String::from_utf8(err)?,
    })
}

#[test]
fn test_workspaces_lists_cache() -> Result<()> {
    let fixture = Fixture::new(&["a.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    let output = capture(|c| ctx.run_workspaces(c))?;
    assert_eq!(output.code, ExitCode::Success);
    assert!(output.out.starts_with(&format!("dev;alice ({})", COLLECTION)));
    assert!(output.out.contains("$/proj: "));
    Ok(())
}

#[test]
fn test_workspaces_filtered_by_other_collection() -> Result<()> {
    let fixture = Fixture::new(&["a.txt"])?;
    let ctx = fixture.context(
        &fixture.local_root,
        CommandOptions {
            collection: Some("http://elsewhere/tfs".to_string()),
            ..options()
        },
    );

    let output = capture(|c| ctx.run_workspaces(c))?;
    assert_eq!(output.out, "No workspaces found.\n");
    Ok(())
}

#[test]
fn test_status_groups_by_directory() -> Result<()> {
    let fixture = Fixture::new(&["a.txt", "b.txt", "sub/c.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    let output = capture(|c| ctx.run_status(&[], false, c))?;
    let root = fixture.local_root.display().to_string();
    let sub = fixture.local_root.join("sub").display().to_string();
    let expected = format!(
        "{}:\nedit: a.txt\nedit: b.txt\n\n{}:\nedit: c.txt\n\n3 change(s)\n",
        root, sub
    );
    assert_eq!(output.out, expected);
    assert_eq!(output.code, ExitCode::Success);
    Ok(())
}

#[test]
fn test_undo_literal_file() -> Result<()> {
    let fixture = Fixture::new(&["a.txt", "b.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    let output = capture(|c| ctx.run_undo(&args(&["a.txt"]), false, c))?;
    assert_eq!(output.code, ExitCode::Success);
    assert!(output.out.ends_with("Undoing: a.txt\n"));
    assert_eq!(fixture.remaining()?, vec!["$/proj/b.txt"]);
    Ok(())
}

#[test]
fn test_undo_wildcard_is_not_recursive_by_default() -> Result<()> {
    let fixture = Fixture::new(&["a.txt", "b.txt", "sub/c.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    capture(|c| ctx.run_undo(&args(&["*.txt"]), false, c))?;
    assert_eq!(fixture.remaining()?, vec!["$/proj/sub/c.txt"]);
    Ok(())
}

#[test]
fn test_undo_directory_recursively() -> Result<()> {
    let fixture = Fixture::new(&["a.txt", "sub/c.txt", "sub/deeper/d.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    capture(|c| ctx.run_undo(&args(&["sub"]), true, c))?;
    assert_eq!(fixture.remaining()?, vec!["$/proj/a.txt"]);
    Ok(())
}

#[test]
fn test_undo_server_path_from_outside_the_workspace() -> Result<()> {
    let fixture = Fixture::new(&["a.txt", "b.txt"])?;
    let outside = fixture.local_root.parent().unwrap_or(fixture.local_root.as_path()).to_path_buf();
    let ctx = fixture.context(
        &outside,
        CommandOptions {
            workspace: Some("DEV;alice".to_string()),
            ..options()
        },
    );

    let output = capture(|c| ctx.run_undo(&args(&["$/PROJ/b.txt"]), false, c))?;
    assert_eq!(output.code, ExitCode::Success);
    assert_eq!(fixture.remaining()?, vec!["$/proj/a.txt"]);
    Ok(())
}

#[test]
fn test_unmatched_literal_fails_whole_batch() -> Result<()> {
    let fixture = Fixture::new(&["a.txt", "b.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    let result = capture(|c| ctx.run_undo(&args(&["a.txt", "c.txt"]), false, c));
    let message = format!("{:#}", result.err().expect("undo should fail"));
    assert!(message.contains("c.txt"), "unexpected error: {}", message);
    assert_eq!(fixture.remaining()?, vec!["$/proj/a.txt", "$/proj/b.txt"]);
    Ok(())
}

#[test]
fn test_unmatched_wildcard_only_warns() -> Result<()> {
    let fixture = Fixture::new(&["a.txt"])?;
    let ctx = fixture.context(&fixture.local_root, options());

    let output = capture(|c| ctx.run_undo(&args(&["a.txt", "*.log"]), false, c))?;
    assert_eq!(output.code, ExitCode::PartialSuccess);
    assert!(output.err.contains("warning: No pending changes were found for *.log"));
    assert_eq!(output.err.matches("No pending changes were found for *.log").count(), 1);
    assert!(!output.err.contains("---- Summary"));
    assert!(fixture.remaining()?.is_empty());
    Ok(())
}

#[test]
fn test_large_batch_prints_summary() -> Result<()> {
    let names: Vec<String> = (0..10).map(|i| format!("f{}.txt", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&names)?;
    let ctx = fixture.context(&fixture.local_root, options());

    let output = capture(|c| ctx.run_undo(&args(&["*.txt", "*.log"]), false, c))?;
    assert_eq!(output.code, ExitCode::PartialSuccess);
    assert!(output
        .err
        .contains("---- Summary: 0 conflicts, 1 warnings, 0 errors ----"));
    assert_eq!(output.err.matches("No pending changes were found for *.log").count(), 1);
    assert_eq!(output.out.matches("Undoing: ").count(), 10);
    Ok(())
}

#[test]
fn test_summary_can_be_disabled() -> Result<()> {
    let names: Vec<String> = (0..10).map(|i| format!("f{}.txt", i)).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&names)?;
    let ctx = fixture.context(
        &fixture.local_root,
        CommandOptions {
            show_summary: false,
            ..CommandOptions::default()
        },
    );

    let output = capture(|c| ctx.run_undo(&args(&["*.txt", "*.log"]), false, c))?;
    assert!(!output.err.contains("---- Summary"));
    assert_eq!(output.err.matches("No pending changes were found for *.log").count(), 1);
    Ok(())
}

#[test]
fn test_workspace_not_determinable() -> Result<()> {
    let fixture = Fixture::new(&["a.txt"])?;
    let outside = fixture.local_root.parent().unwrap_or(fixture.local_root.as_path()).to_path_buf();
    let ctx = fixture.context(&outside, options());

    let result = capture(|c| ctx.run_status(&[], false, c));
    assert!(result.is_err());
    Ok(())
}
