use color_eyre::Result;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::Theme;
use crate::browser::runtime::{self, Env};
use crate::browser::update::{self, update};
use crate::browser::{Command, ExitAction, Model, Msg, SshTarget};
use crate::ssh;
use crate::tui::{Event, Tui};
use crate::view::{self, Spinner};

const FRAME_RATE: f64 = 30.0;
const TICK_RATE: f64 = 10.0;

/// What the browser hands back to `main` once the terminal is restored.
#[derive(Debug, Default)]
pub struct AppOutcome {
    pub exit_action: Option<ExitAction>,
}

enum Wake {
    Terminal(Option<Event>),
    Message(Msg),
}

pub struct App {
    model: Model,
    env: Env,
    theme: Theme,
    spinner: Spinner,
    should_quit: bool,
    exit_action: Option<ExitAction>,
    msg_tx: UnboundedSender<Msg>,
    msg_rx: UnboundedReceiver<Msg>,
}

impl App {
    pub fn new(model: Model, env: Env, theme: Theme) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            model,
            env,
            theme,
            spinner: Spinner::new(),
            should_quit: false,
            exit_action: None,
            msg_tx,
            msg_rx,
        }
    }

    pub async fn run(mut self) -> Result<AppOutcome> {
        let mut tui = Tui::new(FRAME_RATE, TICK_RATE)?;
        tui.enter()?;

        let command = update::init(&mut self.model);
        self.run_command(command, &mut tui)?;

        while !self.should_quit {
            let wake = tokio::select! {
                event = tui.next_event() => Wake::Terminal(event),
                Some(msg) = self.msg_rx.recv() => Wake::Message(msg),
            };
            match wake {
                Wake::Terminal(Some(event)) => self.handle_event(event, &mut tui)?,
                Wake::Terminal(None) => break,
                Wake::Message(msg) => self.handle_msg(msg, &mut tui)?,
            }
        }

        tui.exit()?;
        Ok(AppOutcome {
            exit_action: self.exit_action,
        })
    }

    fn handle_event(&mut self, event: Event, tui: &mut Tui) -> Result<()> {
        match event {
            Event::Init | Event::Render => self.render(tui)?,
            Event::Tick => self.spinner.tick(),
            Event::Quit => self.should_quit = true,
            Event::Suspend => {
                tui.suspend()?;
                tui.resume()?;
            }
            Event::Resize(..) => self.render(tui)?,
            Event::Error(e) => warn!(error = %e, "Terminal event error"),
            Event::Key(key) => self.handle_msg(Msg::Key(key), tui)?,
            Event::Paste(text) => self.handle_msg(Msg::Paste(text), tui)?,
        }
        Ok(())
    }

    fn handle_msg(&mut self, msg: Msg, tui: &mut Tui) -> Result<()> {
        let command = update(&mut self.model, msg);
        self.run_command(command, tui)
    }

    fn run_command(&mut self, command: Command, tui: &mut Tui) -> Result<()> {
        for target in self.dispatch(command) {
            tui.exit()?;
            let result = ssh::run(&target);
            tui.resume()?;
            self.handle_msg(Msg::SshFinished(result), tui)?;
        }
        Ok(())
    }

    /// Spawn every effect, returning the SSH sessions that need the terminal.
    fn dispatch(&mut self, command: Command) -> Vec<SshTarget> {
        let mut sessions = Vec::new();
        for leaf in command.into_leaves() {
            match leaf {
                Command::Quit { exit } => {
                    self.should_quit = true;
                    self.exit_action = exit;
                }
                Command::Ssh(target) => sessions.push(target),
                leaf => self.spawn(leaf),
            }
        }
        sessions
    }

    fn spawn(&self, command: Command) {
        debug!(?command, "Dispatching command");
        let env = self.env.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            if let Some(msg) = runtime::execute(&env, command).await {
                // Closed only while the app is shutting down.
                let _ = tx.send(msg);
            }
        });
    }

    fn render(&mut self, tui: &mut Tui) -> Result<()> {
        tui.draw(|frame| view::render(frame, &self.model, &self.theme, &mut self.spinner))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::mock::MockApi;
    use crate::api::{Api, Method};
    use crate::browser::model::test_model;
    use crate::browser::{Mode, Product, Stamp};
    use crate::config::MemoryStore;

    fn app(api: MockApi) -> App {
        let env = Env {
            api: Arc::new(api) as Arc<dyn Api>,
            store: Arc::new(MemoryStore::default()),
        };
        App::new(test_model(), env, Theme::default())
    }

    #[tokio::test]
    async fn test_effects_report_back_over_the_channel() {
        let mut app = app(MockApi::new().on(
            Method::Get,
            "/v1/cloud/project/p1/instance",
            json!([{ "id": "i1", "name": "web" }]),
        ));
        let command = update::init(&mut app.model);
        assert!(app.dispatch(command).is_empty());

        let msg = app.msg_rx.recv().await.unwrap();
        let Msg::ResourcesLoaded { stamp, result, .. } = msg else {
            panic!("expected a resource list");
        };
        assert_eq!(
            stamp,
            Stamp {
                project: "p1".into(),
                product: Product::Instances,
            }
        );
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!(app.model.mode, Mode::Loading);
    }

    #[tokio::test]
    async fn test_quit_carries_the_exit_action() {
        let mut app = app(MockApi::new());
        let target = SshTarget {
            user: "ubuntu".into(),
            host: "51.0.0.9".into(),
        };
        let sessions = app.dispatch(Command::batch([
            Command::Ssh(target.clone()),
            Command::Quit {
                exit: Some(ExitAction::Ssh(target.clone())),
            },
        ]));
        assert_eq!(sessions, vec![target.clone()]);
        assert!(app.should_quit);
        assert_eq!(app.exit_action, Some(ExitAction::Ssh(target)));
    }
}
