//! Line-oriented presentation layer.
//!
//! Reads one command per line, turns it into an [`Intent`], hands it to the
//! navigator together with the current [`NavigationState`] and prints the
//! result. Failures are printed and the shell keeps going.

mod command;
mod render;

use anyhow::Context;
use s3nav_core::busy::{FRAME_INTERVAL, SharedTitle, with_busy_title};
use s3nav_core::{Intent, NavigationState, Navigator, Outcome, StorageClient, Transition};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub use self::command::{Command, HELP, ParseError};
use crate::TRACING_TARGET_SHELL;

const PROMPT: &[u8] = b"s3nav> ";

/// Label animated while a bucket is being created.
const CREATE_BUCKET_LABEL: &str = "Creating bucket";

/// What the shell does after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print the text and read the next command.
    Continue(String),
    /// Leave the shell.
    Quit,
}

/// Interactive shell over a [`Navigator`].
pub struct Shell<C: ?Sized> {
    navigator: Navigator<C>,
    state: NavigationState,
    identity: String,
    title: SharedTitle,
    spinner: bool,
}

impl<C> Shell<C>
where
    C: StorageClient + ?Sized,
{
    /// Creates a shell with an empty state; call [`Shell::start`] next.
    pub fn new(navigator: Navigator<C>, identity: impl Into<String>) -> Self {
        Self {
            navigator,
            state: NavigationState::default(),
            identity: identity.into(),
            title: SharedTitle::default(),
            spinner: false,
        }
    }

    /// Enables the stderr spinner while bucket creation runs.
    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.spinner = spinner;
        self
    }

    /// Reads the bucket list.
    pub async fn start(&mut self) -> s3nav_core::Result<()> {
        self.state = self.navigator.initial_state().await?;
        self.title.set(render::title(&self.state));

        tracing::info!(
            target: TRACING_TARGET_SHELL,
            identity = %self.identity,
            buckets = self.state.bucket_names.len(),
            "Shell started"
        );
        Ok(())
    }

    /// Returns the current navigation state.
    #[cfg(test)]
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Renders the focused list.
    pub fn view(&self) -> String {
        render::view(&self.state, &self.identity)
    }

    /// Executes one command.
    pub async fn execute(&mut self, command: Command) -> Step {
        let text = match command {
            Command::List => self.view(),
            Command::Whoami => format!("{}\n", self.identity),
            Command::Help => format!("{HELP}\n"),
            Command::Quit => return Step::Quit,
            command => match command.into_intent() {
                Some(intent) => self.dispatch(intent).await,
                None => self.view(),
            },
        };
        Step::Continue(text)
    }

    /// Hands `intent` to the navigator and renders what came back.
    async fn dispatch(&mut self, intent: Intent) -> String {
        let state = std::mem::take(&mut self.state);

        let Transition { state, outcome } = match intent {
            Intent::CreateBucket(_) => self.create_bucket(state, intent).await,
            intent => self.navigator.handle(state, intent).await,
        };
        self.state = state;
        self.title.set(render::title(&self.state));

        match outcome {
            Ok(outcome) => {
                if let Outcome::RenameIncomplete { from, error, .. } = &outcome {
                    tracing::warn!(
                        target: TRACING_TARGET_SHELL,
                        key = %from,
                        error = %error,
                        "Rename left the source object behind"
                    );
                }
                render::outcome(&self.state, &self.identity, &outcome)
            }
            Err(error) => {
                tracing::debug!(target: TRACING_TARGET_SHELL, error = %error, "Intent failed");
                format!("Error: {error}\n")
            }
        }
    }

    /// Runs bucket creation under the busy indicator, echoing it to stderr.
    async fn create_bucket(&self, state: NavigationState, intent: Intent) -> Transition {
        let action = with_busy_title(
            &self.title,
            CREATE_BUCKET_LABEL,
            self.navigator.handle(state, intent),
        );

        if !self.spinner {
            return action.await;
        }

        let title = self.title.clone();
        let printer = tokio::spawn(async move {
            let mut interval = tokio::time::interval(FRAME_INTERVAL);
            loop {
                interval.tick().await;
                eprint!("\r{}", title.get());
            }
        });

        let transition = action.await;
        printer.abort();
        eprint!("\r\x1b[2K");
        transition
    }

    /// Reads commands from `input` until it ends or `quit` is entered.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        output.write_all(self.view().as_bytes()).await?;
        output.write_all(PROMPT).await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await.context("failed to read command")? {
            let text = match line.parse::<Command>() {
                Ok(command) => match self.execute(command).await {
                    Step::Continue(text) => text,
                    Step::Quit => break,
                },
                Err(ParseError::Empty) => String::new(),
                Err(error) => format!("{error}\n"),
            };

            output.write_all(text.as_bytes()).await?;
            output.write_all(PROMPT).await?;
            output.flush().await?;
        }

        tracing::info!(target: TRACING_TARGET_SHELL, "Shell closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use s3nav_core::NavigatorConfig;
    use s3nav_core::mock::{Call, MemoryStorage};

    use super::*;

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_bucket("logs")
                .with_object("media", "photos/2024/c.jpg", "c")
                .with_object("media", "photos/a.txt", "hello")
                .with_object("media", "readme.md", "# media"),
        )
    }

    async fn shell(storage: Arc<MemoryStorage>) -> Shell<MemoryStorage> {
        let navigator = Navigator::new(storage, NavigatorConfig::default());
        let mut shell = Shell::new(navigator, "default");
        shell.start().await.unwrap();
        shell
    }

    async fn exec(shell: &mut Shell<MemoryStorage>, line: &str) -> String {
        match shell.execute(line.parse().unwrap()).await {
            Step::Continue(text) => text,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn browses_down_and_back_up() {
        let mut shell = shell(storage()).await;

        let text = exec(&mut shell, "open media").await;
        assert_eq!(text, "[default] media/\n  d photos/\n  - readme.md\n");

        let text = exec(&mut shell, "cd photos/").await;
        assert!(text.contains("d photos/2024/"));
        assert_eq!(shell.state().prefix, "photos/");

        let text = exec(&mut shell, "cd ..").await;
        assert!(text.starts_with("[default] media/\n"));
        assert_eq!(shell.state().prefix, "");

        let text = exec(&mut shell, "root").await;
        assert!(text.starts_with("[default] Buckets\n"));
    }

    #[tokio::test]
    async fn selecting_an_object_previews_it() {
        let mut shell = shell(storage()).await;
        exec(&mut shell, "open media").await;

        let text = exec(&mut shell, "cd readme.md").await;
        assert_eq!(text, "--- readme.md ---\n# media\n");
        assert_eq!(shell.state().prefix, "");
    }

    #[tokio::test]
    async fn errors_are_printed_and_state_is_kept() {
        let mut shell = shell(storage()).await;

        let text = exec(&mut shell, "rm readme.md").await;
        assert_eq!(text, "Error: no bucket selected\n");
        assert!(shell.state().at_bucket_level());
    }

    #[tokio::test]
    async fn rename_refreshes_the_listing() {
        let storage = storage();
        let mut shell = shell(Arc::clone(&storage)).await;
        exec(&mut shell, "open media").await;

        let text = exec(&mut shell, "mv readme.md README.md").await;
        assert!(text.starts_with("Renamed readme.md -> README.md\n"));
        assert!(text.contains("- README.md"));
        assert!(storage.contains("media", "README.md"));
        assert!(!storage.contains("media", "readme.md"));
    }

    #[tokio::test]
    async fn folders_cannot_be_deleted() {
        let storage = storage();
        let mut shell = shell(Arc::clone(&storage)).await;
        exec(&mut shell, "open media").await;
        storage.clear_calls();

        let text = exec(&mut shell, "rm photos/").await;
        assert!(text.contains("is a folder"));
        assert_eq!(
            storage.count_calls(|call| matches!(call, Call::DeleteObject { .. })),
            0
        );
    }

    #[tokio::test]
    async fn search_then_pick() {
        let mut shell = shell(storage()).await;

        let text = exec(&mut shell, "/ med").await;
        assert_eq!(text, "[default] Buckets (search: 1 match)\n  media\n");

        let text = exec(&mut shell, "pick media").await;
        assert!(text.starts_with("[default] media/\n"));
        assert_eq!(shell.state().bucket(), Some("media"));
    }

    #[tokio::test]
    async fn creating_a_bucket_updates_the_bucket_list() {
        let storage = storage();
        let mut shell = shell(Arc::clone(&storage)).await;

        let text = exec(&mut shell, "mb reports").await;
        assert!(text.starts_with("Created bucket reports\n"));
        assert!(shell.state().bucket_names.contains(&"reports".to_string()));
        assert!(storage.has_bucket("reports"));
    }

    #[tokio::test]
    async fn run_reads_until_quit() {
        let mut shell = shell(storage()).await;
        let input: &[u8] = b"whoami\nbogus\n\nquit\nls\n";
        let mut output = Vec::new();

        shell.run(input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("[default] Buckets\n  logs\n  media\n"));
        assert!(output.contains("s3nav> default\n"));
        assert!(output.contains("unknown command 'bogus'"));
        assert_eq!(output.matches("s3nav> ").count(), 4);
    }
}
