use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chatplus_routing::{
    ChatOverlay, ChatWindow, IncomingMessage, RouteOutcome, Router, SequenceId, TabRef,
};
use chatplus_settings::SettingsStore;
use snafu::{ResultExt, Snafu};

use crate::renderer::{DEFAULT_VISIBLE_LINES, TextRenderer, format_line};

/// Input line that triggers a redraw instead of being routed.
pub const RENDER_COMMAND: &str = "::render";
/// Input line that re-reads the settings file and applies it.
pub const RELOAD_COMMAND: &str = "::reload";
/// `::find <text>` lists delivered messages containing `text`.
pub const FIND_COMMAND: &str = "::find";
/// `::deletable <sequence id>` marks every delivered copy as deletable.
pub const DELETABLE_COMMAND: &str = "::deletable";

/// Host control line; anything else is routed as chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand<'a> {
    Render,
    Reload,
    Find(&'a str),
    Deletable(&'a str),
}

impl<'a> HostCommand<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();
        match command {
            RENDER_COMMAND => Some(Self::Render),
            RELOAD_COMMAND => Some(Self::Reload),
            FIND_COMMAND => Some(Self::Find(argument)),
            DELETABLE_COMMAND => Some(Self::Deletable(argument)),
            _ => None,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum OverlayError {
    #[snafu(display("failed to read chat input on `{stage}`: {source}"))]
    ReadInput {
        stage: &'static str,
        source: io::Error,
    },
    #[snafu(display("failed to write chat output on `{stage}`: {source}"))]
    WriteOutput {
        stage: &'static str,
        source: io::Error,
    },
    #[snafu(display("missing value for `{flag}` on `{stage}`"))]
    MissingArgument {
        stage: &'static str,
        flag: &'static str,
    },
    #[snafu(display("unknown argument '{argument}' on `{stage}`"))]
    UnknownArgument {
        stage: &'static str,
        argument: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostArgs {
    pub settings_path: Option<PathBuf>,
}

impl HostArgs {
    /// Parses arguments without the program name.
    pub fn parse<I>(args: I) -> Result<Self, OverlayError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(argument) = args.next() {
            match argument.as_str() {
                "--settings" => {
                    let value = args.next().ok_or_else(|| {
                        MissingArgumentSnafu {
                            stage: "parse-host-args",
                            flag: "--settings",
                        }
                        .build()
                    })?;
                    parsed.settings_path = Some(PathBuf::from(value));
                }
                _ => {
                    return UnknownArgumentSnafu {
                        stage: "parse-host-args",
                        argument,
                    }
                    .fail();
                }
            }
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSummary {
    pub received: u64,
    pub delivered: u64,
    pub suppressed: u64,
    pub unrouted: u64,
}

/// Feeds every input line to the overlay as one chat message.
///
/// The host keeps its own raw history, which it draws whenever the overlay
/// declines to render. `store` backs `::reload`; without one the command is
/// ignored.
pub fn run<R, W>(
    overlay: &mut ChatOverlay,
    store: Option<&SettingsStore>,
    input: R,
    mut output: W,
) -> Result<HostSummary, OverlayError>
where
    R: BufRead,
    W: Write,
{
    let mut summary = HostSummary::default();
    let mut history = VecDeque::new();

    for line in input.lines() {
        let line = line.context(ReadInputSnafu {
            stage: "read-chat-line",
        })?;
        if let Some(command) = HostCommand::parse(&line) {
            match command {
                HostCommand::Render => render(overlay, &history, &mut output)?,
                HostCommand::Reload => reload(overlay, store),
                HostCommand::Find(filter) => find(overlay, filter, &mut output)?,
                HostCommand::Deletable(argument) => mark_deletable(overlay, argument),
            }
            continue;
        }

        summary.received += 1;
        history.push_back(line.clone());
        if history.len() > DEFAULT_VISIBLE_LINES {
            history.pop_front();
        }

        let incoming = IncomingMessage::new(line, SequenceId::new(summary.received));
        match overlay.route_message(incoming) {
            RouteOutcome::Delivered { .. } => summary.delivered += 1,
            RouteOutcome::Suppressed => summary.suppressed += 1,
            RouteOutcome::NoDestinations | RouteOutcome::Disabled => summary.unrouted += 1,
        }
    }

    render(overlay, &history, &mut output)?;
    tracing::info!(
        "routed {} message(s): {} delivered, {} suppressed, {} unrouted",
        summary.received,
        summary.delivered,
        summary.suppressed,
        summary.unrouted
    );
    Ok(summary)
}

fn render<W: Write>(
    overlay: &ChatOverlay,
    history: &VecDeque<String>,
    output: &mut W,
) -> Result<(), OverlayError> {
    let mut renderer = TextRenderer::new(&mut *output);
    let drawn = overlay.render_all(&mut renderer);
    renderer.finish().context(WriteOutputSnafu {
        stage: "render-chat-windows",
    })?;

    if !drawn {
        for line in history {
            writeln!(output, "{line}").context(WriteOutputSnafu {
                stage: "render-host-chat",
            })?;
        }
    }
    Ok(())
}

fn reload(overlay: &mut ChatOverlay, store: Option<&SettingsStore>) {
    let Some(store) = store else {
        tracing::warn!("no settings file in use, ignoring {}", RELOAD_COMMAND);
        return;
    };
    store.reload().apply_to(overlay.context_mut());
}

fn find<W: Write>(overlay: &ChatOverlay, filter: &str, output: &mut W) -> Result<(), OverlayError> {
    let context = overlay.context();
    let mut lines = Vec::new();
    for (target, tab) in context.tabs() {
        let label = match target {
            TabRef::Default => tab.name().to_string(),
            TabRef::Window { window, .. } => {
                let window = context.windows().get(window).map_or("", ChatWindow::name);
                format!("{window}/{}", tab.name())
            }
        };
        for message in tab.find(filter) {
            lines.push(format!("  [{label}] {}", format_line(message)));
        }
    }

    let mut write = || -> io::Result<()> {
        writeln!(output, "-- find \"{filter}\": {} match(es)", lines.len())?;
        for line in &lines {
            writeln!(output, "{line}")?;
        }
        Ok(())
    };
    write().context(WriteOutputSnafu {
        stage: "write-find-results",
    })
}

fn mark_deletable(overlay: &mut ChatOverlay, argument: &str) {
    let Ok(sequence_id) = argument.parse::<u64>() else {
        tracing::warn!("{} needs a sequence id, got '{}'", DELETABLE_COMMAND, argument);
        return;
    };
    let tabs = overlay
        .context_mut()
        .set_deletable(SequenceId::new(sequence_id), true);
    tracing::info!("marked message {} deletable in {} tab(s)", sequence_id, tabs);
}

#[cfg(test)]
mod tests {
    use chatplus_routing::{ChatTab, RouterContext, RoutingEvent, TabRule};

    use super::*;

    fn overlay() -> ChatOverlay {
        let guild = ChatTab::new("Guild", TabRule::pattern(r"^\[Guild\]", true)).with_priority(5);
        let context = RouterContext::new(ChatTab::new("Default", TabRule::Any)).with_windows(vec![
            ChatWindow::new("Main")
                .with_tab(guild)
                .with_tab(ChatTab::new("All", TabRule::Any)),
        ]);
        ChatOverlay::new(context)
    }

    fn run_to_string(
        overlay: &mut ChatOverlay,
        store: Option<&SettingsStore>,
        input: &str,
    ) -> (HostSummary, String) {
        let mut output = Vec::new();
        let summary = run(overlay, store, input.as_bytes(), &mut output).unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn routes_lines_and_renders_at_end() {
        let mut overlay = overlay();

        let (summary, output) = run_to_string(&mut overlay, None, "[Guild] hi\nplain\n");

        assert_eq!(
            summary,
            HostSummary {
                received: 2,
                delivered: 2,
                suppressed: 0,
                unrouted: 0,
            }
        );
        assert_eq!(
            output,
            concat!(
                "== window 1 (Main)\n",
                "  [Guild] priority=5 messages=1\n",
                "    #1 [Guild] hi\n",
                "  [All] priority=0 messages=1\n",
                "    #2 plain\n",
            )
        );
    }

    #[test]
    fn render_command_is_not_routed() {
        let mut overlay = overlay();

        let (summary, output) = run_to_string(&mut overlay, None, "plain\n::render\n");

        assert_eq!(summary.received, 1);
        assert_eq!(output.matches("== window 1 (Main)").count(), 2);
    }

    #[test]
    fn suppressed_lines_are_counted() {
        let mut overlay = overlay();
        overlay.register_handler("mute", |event: &mut RoutingEvent| {
            if event.message().raw_content().contains("spam") {
                event.suppress();
            }
            Ok(())
        });

        let (summary, _) = run_to_string(&mut overlay, None, "spam\nhello\n");

        assert_eq!(summary.suppressed, 1);
        assert_eq!(summary.delivered, 1);
    }

    #[test]
    fn disabled_overlay_falls_back_to_host_history() {
        let mut overlay = overlay();
        overlay.context_mut().set_enabled(false);

        let (summary, output) = run_to_string(&mut overlay, None, "one\ntwo\n");

        assert_eq!(summary.unrouted, 2);
        assert_eq!(output, "one\ntwo\n");
    }

    #[test]
    fn parses_host_commands() {
        assert_eq!(HostCommand::parse(" ::render "), Some(HostCommand::Render));
        assert_eq!(HostCommand::parse("::reload"), Some(HostCommand::Reload));
        assert_eq!(HostCommand::parse("::find  wts "), Some(HostCommand::Find("wts")));
        assert_eq!(HostCommand::parse("::find"), Some(HostCommand::Find("")));
        assert_eq!(HostCommand::parse("::deletable 3"), Some(HostCommand::Deletable("3")));
        assert_eq!(HostCommand::parse("::rendering"), None);
        assert_eq!(HostCommand::parse("hello ::render"), None);
    }

    #[test]
    fn find_lists_matches_per_tab() {
        let mut overlay = overlay();

        let (summary, output) =
            run_to_string(&mut overlay, None, "[Guild] WTS sword\nwts bow\nhi\n::find wts\n");

        assert_eq!(summary.received, 3);
        let find_output = output.split("== window").next().unwrap_or_default();
        assert_eq!(
            find_output,
            concat!(
                "-- find \"wts\": 2 match(es)\n",
                "  [Main/Guild] #1 [Guild] WTS sword\n",
                "  [Main/All] #2 wts bow\n",
            )
        );
    }

    #[test]
    fn deletable_command_marks_delivered_copies() {
        let mut overlay = overlay();

        run_to_string(&mut overlay, None, "[Guild] hi\nplain\n::deletable 1\n::deletable x\n");

        let flagged = overlay
            .context()
            .tabs()
            .flat_map(|(_, tab)| tab.messages())
            .map(|message| (message.sequence_id(), message.deletable))
            .collect::<Vec<_>>();
        assert_eq!(
            flagged,
            vec![(SequenceId::new(1), true), (SequenceId::new(2), false)]
        );
    }

    #[test]
    fn reload_applies_edited_layout_and_keeps_logs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"windows": [{"name": "Main", "tabs": [{"name": "Guild", "pattern": "guild"}]}]}"#,
        )
        .unwrap();
        let store = SettingsStore::open(path.clone());
        let mut overlay = ChatOverlay::new(store.settings().build_context());

        let mut first = Vec::new();
        run(&mut overlay, Some(&store), "guild hi\n".as_bytes(), &mut first).unwrap();

        std::fs::write(
            &path,
            r#"{"windows": [{"name": "Main", "tabs": [
                {"name": "Trade", "pattern": "wts"},
                {"name": "Guild", "pattern": "guild", "priority": 3}
            ]}]}"#,
        )
        .unwrap();
        let (summary, _) = run_to_string(&mut overlay, Some(&store), "::reload\nwts bow\n");

        assert_eq!(summary.delivered, 1);
        let main = &overlay.context().windows()[0];
        assert_eq!(main.find_tab("Guild").map(ChatTab::message_count), Some(1));
        assert_eq!(main.find_tab("Guild").map(ChatTab::priority), Some(3));
        assert_eq!(main.find_tab("Trade").map(ChatTab::message_count), Some(1));
    }

    #[test]
    fn reload_without_store_is_ignored() {
        let mut overlay = overlay();

        let (summary, _) = run_to_string(&mut overlay, None, "::reload\nhi\n");

        assert_eq!(summary.received, 1);
        assert_eq!(overlay.context().windows()[0].sorted_tabs().len(), 2);
    }

    #[test]
    fn parses_settings_flag() {
        let args = HostArgs::parse(["--settings".to_string(), "chat.json".to_string()]).unwrap();
        assert_eq!(args.settings_path, Some(PathBuf::from("chat.json")));

        assert!(matches!(
            HostArgs::parse(["--settings".to_string()]),
            Err(OverlayError::MissingArgument { .. })
        ));
        assert!(matches!(
            HostArgs::parse(["--verbose".to_string()]),
            Err(OverlayError::UnknownArgument { .. })
        ));
        assert_eq!(HostArgs::parse(Vec::new()).unwrap(), HostArgs::default());
    }
}
