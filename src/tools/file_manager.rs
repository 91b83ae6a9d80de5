//! FILE_MANAGER tool - navigates directories and reads/writes files
//!
//! Keeps a current directory per tool instance. Every relative path a
//! command takes is resolved against it, never against the process cwd.

use super::{unknown_command, Args, CommandDescriptor, MissingArgument, Tool, ToolOutcome};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

pub struct FileManagerTool {
    current_dir: Mutex<PathBuf>,
}

impl FileManagerTool {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            current_dir: Mutex::new(working_dir),
        }
    }

    fn current_dir(&self) -> PathBuf {
        self.current_dir
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve `path` against the current directory, expanding a leading `~`
    fn resolve(&self, path: &str) -> PathBuf {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        match (path.strip_prefix('~'), home) {
            (Some(""), Some(home)) => home,
            (Some(rest), Some(home)) if rest.starts_with('/') => home.join(rest.trim_start_matches('/')),
            _ => self.current_dir().join(path),
        }
    }

    async fn list(&self) -> ToolOutcome {
        let dir = self.current_dir();
        let mut names = Vec::new();
        let listing = async {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            Ok::<_, std::io::Error>(())
        };
        if let Err(e) = listing.await {
            return ToolOutcome::failed(format!("Listing the directory failed because of {e}"));
        }
        names.sort();
        ToolOutcome::succeeded(format!(
            "These files are in the current directory: '{}'",
            names.join(", ")
        ))
    }

    async fn pwd(&self) -> ToolOutcome {
        let dir = self.current_dir();
        let shown = tokio::fs::canonicalize(&dir).await.unwrap_or(dir);
        ToolOutcome::succeeded(format!("The current directory is {}", shown.display()))
    }

    async fn cd(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let requested = args.get(0)?;
        let target = self.resolve(requested);

        let is_dir = tokio::fs::metadata(&target)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Ok(ToolOutcome::failed(format!(
                "{requested} is not a valid path, please try again with a different path"
            )));
        }

        let target = tokio::fs::canonicalize(&target).await.unwrap_or(target);
        tracing::debug!(dir = %target.display(), "Changed directory");
        *self.current_dir.lock().unwrap_or_else(PoisonError::into_inner) = target.clone();
        Ok(ToolOutcome::succeeded(format!(
            "Changed the current directory to {}",
            target.display()
        )))
    }

    async fn write(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let name = args.get(0)?;
        let contents = args.rest(1, " ");
        Ok(match tokio::fs::write(self.resolve(name), contents).await {
            Ok(()) => ToolOutcome::succeeded(format!("Successfully wrote to {name}")),
            Err(e) => io_failure(&e),
        })
    }

    async fn read(&self, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        let name = args.get(0)?;
        Ok(match tokio::fs::read_to_string(self.resolve(name)).await {
            Ok(contents) => {
                ToolOutcome::succeeded(format!("The file {name}'s contents are: '{contents}'"))
            }
            Err(e) => io_failure(&e),
        })
    }
}

fn io_failure(e: &std::io::Error) -> ToolOutcome {
    ToolOutcome::failed(format!("File opening failed because of {e}"))
}

#[async_trait]
impl Tool for FileManagerTool {
    fn name(&self) -> &str {
        "FILE_MANAGER"
    }

    fn short_description(&self) -> String {
        "The file manager tool can move between directories and view/open files in them".to_string()
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new("LS", "List the current directory's contents", &[]),
            CommandDescriptor::new("PWD", "Print the current directory's path", &[]),
            CommandDescriptor::new("CD", "Change directory", &["Relative path to new directory"]),
            CommandDescriptor::new("WRITE", "Write a file", &["File name", "file contents"]),
            CommandDescriptor::new("READ", "Read a file", &["File name"]),
        ]
    }

    fn examples(&self) -> [String; 2] {
        [
            "user: What files are on my desktop\nassistant: %FILE_MANAGER CD ~/Desktop\nsystem: Changed the current directory to /home/user/Desktop\nassistant: %FILE_MANAGER LS\nsystem: These files are in the current directory: 'dogs.txt, example.png'\nassistant: The files dogs.txt and example.png are on your desktop\nuser: What is in dogs.txt\nassistant: %FILE_MANAGER READ dogs.txt\nsystem: The file dogs.txt's contents are: 'golden retriever, german shepherd, french bulldog'\nassistant: The dogs.txt file includes the names of three dog breeds".to_string(),
            "user: Can you make a list of where I want to go on vacation?\nassistant: Sure, which destinations did you have in mind?\nuser: I want to go to Mexico between January 1st and 4th, and Germany between March 7th and 12th.  Can you save that with my documents\nassistant: %FILE_MANAGER CD ~/Documents\nsystem: Changed the current directory to /home/user/Documents\nassistant: %FILE_MANAGER WRITE vacations.txt Mexico: 1/1-1/4, Germany: 3/7-3/12\nsystem: Successfully wrote to vacations.txt\nassistant: I noted those destinations in your documents folder".to_string(),
        ]
    }

    async fn execute(&self, command: &str, args: Args<'_>) -> Result<ToolOutcome, MissingArgument> {
        match command {
            "LS" => Ok(self.list().await),
            "PWD" => Ok(self.pwd().await),
            "CD" => self.cd(args).await,
            "WRITE" => self.write(args).await,
            "READ" => self.read(args).await,
            _ => Ok(unknown_command(self.name(), command)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{dispatch, Dispatch};
    use crate::state_machine::Status;
    use crate::tools::ToolRegistry;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn canonical(path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap()
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    fn setup() -> (TempDir, ToolRegistry) {
        let dir = TempDir::new().unwrap();
        let tool = FileManagerTool::new(dir.path().to_path_buf());
        let registry = ToolRegistry::new(vec![Arc::new(tool)]).unwrap();
        (dir, registry)
    }

    async fn run(registry: &ToolRegistry, command: &str, words: &[&str]) -> ToolOutcome {
        registry
            .get("FILE_MANAGER")
            .unwrap()
            .invoke(command, &args(words))
            .await
    }

    #[tokio::test]
    async fn test_write_then_read_collapses_whitespace() {
        let (dir, registry) = setup();
        // As dispatched from "%FILE_MANAGER WRITE notes.txt hello   big\nworld"
        let outcome = run(&registry, "WRITE", &["notes.txt", "hello", "big", "world"]).await;
        assert_eq!(outcome, ToolOutcome::succeeded("Successfully wrote to notes.txt"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "hello big world"
        );

        let outcome = run(&registry, "READ", &["notes.txt"]).await;
        assert_eq!(
            outcome,
            ToolOutcome::succeeded("The file notes.txt's contents are: 'hello big world'")
        );
    }

    #[tokio::test]
    async fn test_raw_reply_write_then_read() {
        let (dir, registry) = setup();

        let written = dispatch("%FILE_MANAGER WRITE notes.txt a   b\nc", &registry).await;
        let Dispatch::Tool { outcome, .. } = written else {
            panic!("expected tool dispatch");
        };
        assert_eq!(outcome, ToolOutcome::succeeded("Successfully wrote to notes.txt"));
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "a b c");

        let read = dispatch("%FILE_MANAGER READ notes.txt", &registry).await;
        assert_eq!(
            read,
            Dispatch::Tool {
                tool: "FILE_MANAGER".to_string(),
                command: "READ".to_string(),
                outcome: ToolOutcome::succeeded("The file notes.txt's contents are: 'a b c'"),
            }
        );
    }

    #[tokio::test]
    async fn test_write_without_contents_creates_empty_file() {
        let (dir, registry) = setup();
        let outcome = run(&registry, "WRITE", &["empty.txt"]).await;
        assert_eq!(outcome.status, Status::Succeeded);
        assert_eq!(std::fs::read_to_string(dir.path().join("empty.txt")).unwrap(), "");
    }

    #[tokio::test]
    async fn test_ls_is_sorted() {
        let (dir, registry) = setup();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let outcome = run(&registry, "LS", &[]).await;
        assert_eq!(
            outcome,
            ToolOutcome::succeeded("These files are in the current directory: 'a.txt, b.txt, sub'")
        );
    }

    #[tokio::test]
    async fn test_cd_moves_relative_paths() {
        let (dir, registry) = setup();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("inner.txt"), "deep").unwrap();

        let outcome = run(&registry, "CD", &["sub"]).await;
        let sub = canonical(&dir.path().join("sub"));
        assert_eq!(
            outcome,
            ToolOutcome::succeeded(format!("Changed the current directory to {}", sub.display()))
        );

        let outcome = run(&registry, "PWD", &[]).await;
        assert_eq!(
            outcome.message,
            format!("The current directory is {}", sub.display())
        );

        let outcome = run(&registry, "READ", &["inner.txt"]).await;
        assert_eq!(outcome.message, "The file inner.txt's contents are: 'deep'");

        run(&registry, "CD", &[".."]).await;
        let outcome = run(&registry, "LS", &[]).await;
        assert!(outcome.message.contains("sub"));
    }

    #[tokio::test]
    async fn test_cd_rejects_missing_and_file_paths() {
        let (dir, registry) = setup();
        std::fs::write(dir.path().join("file.txt"), "").unwrap();

        for target in ["missing", "file.txt"] {
            let outcome = run(&registry, "CD", &[target]).await;
            assert_eq!(
                outcome,
                ToolOutcome::failed(format!(
                    "{target} is not a valid path, please try again with a different path"
                ))
            );
        }
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let (_dir, registry) = setup();
        let outcome = run(&registry, "READ", &["nope.txt"]).await;
        assert_eq!(outcome.status, Status::FailedReprompt);
        assert!(outcome.message.starts_with("File opening failed because of "));
    }

    #[tokio::test]
    async fn test_arity_faults() {
        let (_dir, registry) = setup();
        let outcome = run(&registry, "WRITE", &[]).await;
        assert_eq!(
            outcome.message,
            "Not enough arguments were included to run %FILE_MANAGER WRITE.  The WRITE command requires File name, file contents as arguments, separated by spaces"
        );
        let outcome = run(&registry, "CD", &[]).await;
        assert_eq!(outcome.status, Status::FailedReprompt);
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let Some(home) = std::env::var_os("HOME").map(PathBuf::from) else {
            return;
        };
        let tool = FileManagerTool::new(PathBuf::from("/tmp"));
        assert_eq!(tool.resolve("~"), home);
        assert_eq!(tool.resolve("~/Desktop"), home.join("Desktop"));
        assert_eq!(tool.resolve("docs"), Path::new("/tmp").join("docs"));
    }
}
