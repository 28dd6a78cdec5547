//! Line-oriented review form.
//!
//! One command per input line; the current card is redrawn after each one.
//! Failures are reported inline and never end the loop.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use minerva_core::{AiLabel, Decision, Direction, Filter, NavError, Reanchor};
use minerva_store::{PromptCache, RowSource};

use crate::display::{self, Card};
use crate::session::{ReviewSession, SaveOutcome};

const HELP: &str = "\
commands:
  n | next            next row
  p | prev            previous row
  g <row>             jump to row id
  i <n>               jump to position n (1-based)
  d <decision>        choose a decision
  ai <label>          override the AI label (yes / no / text, none clears)
  why <text>          override the AI justification
  s | save            save the current row
  u                   toggle unreviewed-only
  r                   reload from the sheet
  x <path>            export the current view as CSV
  h | help            this help
  q | quit            leave";

const HIDDEN: &str = "the AI fields stay hidden until your decision for this row is saved";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Prev,
    Goto(i64),
    Index(usize),
    Decide(String),
    Ai(AiLabel),
    Why(String),
    Save,
    ToggleUnreviewed,
    Reload,
    Export(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((v, r)) => (v, r.trim()),
            None => (line, ""),
        };
        let need = |what: &str| -> Result<(), String> {
            if rest.is_empty() {
                Err(format!("'{verb}' needs {what}"))
            } else {
                Ok(())
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "n" | "next" => Ok(Command::Next),
            "p" | "prev" => Ok(Command::Prev),
            "g" | "goto" => {
                need("a row id")?;
                rest.parse()
                    .map(Command::Goto)
                    .map_err(|_| format!("'{rest}' is not a row id"))
            }
            "i" | "index" => {
                need("a position")?;
                match rest.parse::<usize>() {
                    Ok(n) if n >= 1 => Ok(Command::Index(n - 1)),
                    _ => Err(format!("'{rest}' is not a position")),
                }
            }
            "d" | "decide" => {
                need("a decision")?;
                Ok(Command::Decide(rest.to_string()))
            }
            "ai" => {
                need("a label")?;
                let label = match rest.to_ascii_lowercase().as_str() {
                    "none" | "clear" | "-" => AiLabel::Absent,
                    _ => AiLabel::normalize(rest),
                };
                Ok(Command::Ai(label))
            }
            "why" => {
                need("some text")?;
                Ok(Command::Why(rest.to_string()))
            }
            "s" | "save" => Ok(Command::Save),
            "u" | "unreviewed" => Ok(Command::ToggleUnreviewed),
            "r" | "reload" => Ok(Command::Reload),
            "x" | "export" => {
                need("a path")?;
                Ok(Command::Export(PathBuf::from(rest)))
            }
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}' (h for help)")),
        }
    }
}

/// Run the form until `q` or end of input.
pub async fn run<S, R, W>(
    session: &mut ReviewSession<S>,
    prompts: &mut PromptCache,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: RowSource,
    R: BufRead,
    W: Write,
{
    if let Err(e) = session.refresh().await {
        writeln!(out, "error: could not load the sheet: {e}")?;
    }
    render(session, prompts, out)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(c) => c,
            Err(msg) => {
                writeln!(out, "warning: {msg}")?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        apply(session, command, out).await?;
        render(session, prompts, out)?;
    }
    Ok(())
}

async fn apply<S, W>(
    session: &mut ReviewSession<S>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: RowSource,
    W: Write,
{
    match command {
        Command::Next => {
            session.advance(Direction::Next);
        }
        Command::Prev => {
            session.advance(Direction::Prev);
        }
        Command::Goto(row_id) => {
            if let Err(e) = session.goto_row_id(row_id) {
                nav_warning(out, &e)?;
            }
        }
        Command::Index(index) => {
            if let Err(e) = session.goto_index(index) {
                nav_warning(out, &e)?;
            }
        }
        Command::Decide(raw) => {
            let accepted = Decision::parse(&raw).is_some_and(|d| session.set_decision(d));
            if !accepted {
                let names: Vec<&str> = session
                    .variant()
                    .choices()
                    .iter()
                    .map(|d| d.as_str())
                    .collect();
                writeln!(out, "warning: '{raw}' is not one of: {}", names.join(", "))?;
            }
        }
        Command::Ai(label) => {
            if !session.set_ai_label(label) {
                writeln!(out, "warning: {HIDDEN}")?;
            }
        }
        Command::Why(text) => {
            if !session.set_ai_justification(text) {
                writeln!(out, "warning: {HIDDEN}")?;
            }
        }
        Command::Save => match session.save().await {
            Ok(SaveOutcome::Saved(row_id)) => writeln!(out, "Saved row {row_id}.")?,
            Ok(SaveOutcome::Failed(row_id)) => writeln!(
                out,
                "warning: row {row_id} was not saved; your edit is kept, 's' to retry"
            )?,
            Ok(SaveOutcome::MissingDecision) => {
                writeln!(out, "warning: choose a decision first (d <decision>)")?
            }
            Ok(SaveOutcome::NoRecord) => writeln!(out, "warning: nothing to save")?,
            Err(e) => writeln!(out, "error: saved, but reloading failed: {e}")?,
        },
        Command::ToggleUnreviewed => {
            let filter = session.filter().toggled();
            report_refresh(out, session.set_filter(filter).await)?;
        }
        Command::Reload => report_refresh(out, session.reload().await)?,
        Command::Export(path) => match session.export(&path) {
            Ok(rows) => writeln!(out, "Exported {rows} rows to {}.", path.display())?,
            Err(e) => writeln!(out, "error: export failed: {e}")?,
        },
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => {}
    }
    Ok(())
}

fn nav_warning<W: Write>(out: &mut W, e: &NavError) -> std::io::Result<()> {
    writeln!(out, "warning: {e}")
}

fn report_refresh<W: Write>(
    out: &mut W,
    result: Result<Reanchor, minerva_store::StoreError>,
) -> std::io::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) => writeln!(out, "error: could not load the sheet: {e}"),
    }
}

fn render<S, W>(
    session: &ReviewSession<S>,
    prompts: &mut PromptCache,
    out: &mut W,
) -> std::io::Result<()>
where
    S: RowSource,
    W: Write,
{
    if let Err(e) = prompts.current() {
        writeln!(out, "warning: prompt file not reloaded: {e}")?;
    }
    let lookup = prompts.lookup();

    let Some(progress) = session.progress() else {
        return writeln!(out, "(no data: 'r' to retry)");
    };
    writeln!(out)?;
    writeln!(out, "{}", display::render_progress(&progress))?;

    let (Some(record), Some((position, total))) = (session.current(), session.position()) else {
        let msg = match session.filter() {
            Filter::UnreviewedOnly => "No unreviewed rows. 'u' shows all rows.",
            Filter::All => "The sheet has no rows.",
        };
        return writeln!(out, "{msg}");
    };

    let card = Card {
        record,
        position,
        total,
        filter: session.filter(),
        guidance: lookup.guidance_for(record.sr_id),
        revealed: session.is_revealed(record),
        draft: session.draft(),
        choices: session.variant().choices(),
    };
    write!(out, "{}", display::render_card(&card))?;
    writeln!(out, "> (h for help)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use minerva_core::{Record, RevealMode};
    use minerva_store::MemorySheet;
    use std::io::Cursor;

    fn sheet() -> MemorySheet {
        let rows = [(10, 1, ""), (20, 2, ""), (30, 1, "")]
            .into_iter()
            .map(|(id, sr, d)| {
                let mut r = Record::new(id);
                r.sr_id = sr;
                r.title = format!("Study {id}");
                r.decision = Decision::normalize(d);
                r.ai_label = AiLabel::Yes;
                r.ai_justification = format!("AI reason {id}");
                r
            })
            .collect();
        MemorySheet::new(rows)
    }

    fn prompts(dir: &tempfile::TempDir) -> PromptCache {
        let path = dir.path().join("prompts.csv");
        std::fs::write(&path, "SR,Prompt\n1,Guidance one\n2,Guidance two\n").unwrap();
        PromptCache::open(path).unwrap()
    }

    async fn drive(session: &mut ReviewSession<MemorySheet>, script: &str) -> String {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut prompts = prompts(&tmp);
        let mut out = Vec::new();
        run(session, &mut prompts, Cursor::new(script.to_string()), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!("n".parse::<Command>(), Ok(Command::Next));
        assert_eq!(" g 20 ".parse::<Command>(), Ok(Command::Goto(20)));
        assert_eq!("i 1".parse::<Command>(), Ok(Command::Index(0)));
        assert_eq!(
            "d Include".parse::<Command>(),
            Ok(Command::Decide("Include".into()))
        );
        assert_eq!("ai yes".parse::<Command>(), Ok(Command::Ai(AiLabel::Yes)));
        assert_eq!(
            "why adults, not children".parse::<Command>(),
            Ok(Command::Why("adults, not children".into()))
        );
        assert_eq!(
            "x out.csv".parse::<Command>(),
            Ok(Command::Export(PathBuf::from("out.csv")))
        );
        assert_eq!("ai none".parse::<Command>(), Ok(Command::Ai(AiLabel::Absent)));
        assert_eq!("Q".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("g".parse::<Command>().is_err());
        assert!("g abc".parse::<Command>().is_err());
        assert!("i 0".parse::<Command>().is_err());
        assert!("frobnicate".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn first_card_shows_matching_guidance() {
        let mut session = ReviewSession::new(sheet(), SessionOptions::default());
        let out = drive(&mut session, "q\n").await;
        assert!(out.contains("=== Row 10 (1 of 3, all rows) ==="));
        assert!(out.contains("Guidance one"));
        assert!(out.contains("Total rows: 3"));
    }

    #[tokio::test]
    async fn decide_and_save_in_unreviewed_view() {
        let opts = SessionOptions {
            filter: Filter::UnreviewedOnly,
            ..SessionOptions::default()
        };
        let mut session = ReviewSession::new(sheet(), opts);
        let out = drive(&mut session, "g 20\nd exclude\ns\ng 20\nq\n").await;
        assert!(out.contains("Saved row 20."));
        assert!(out.contains("warning: row 20 is not in the current view"));
        assert_eq!(session.current().unwrap().row_id, 10);
    }

    #[tokio::test]
    async fn save_without_decision_warns() {
        let mut session = ReviewSession::new(sheet(), SessionOptions::default());
        let out = drive(&mut session, "s\n").await;
        assert!(out.contains("choose a decision first"));
    }

    #[tokio::test]
    async fn failed_save_keeps_selection() {
        let source = sheet();
        source.reject_saves(true);
        let mut session = ReviewSession::new(source, SessionOptions::default());
        let out = drive(&mut session, "d include\ns\n").await;
        assert!(out.contains("row 10 was not saved"));
        assert_eq!(session.draft().decision, Some(Decision::Include));
    }

    #[tokio::test]
    async fn decision_outside_variant_is_rejected() {
        let mut session = ReviewSession::new(sheet(), SessionOptions::default());
        let out = drive(&mut session, "d yes\n").await;
        assert!(out.contains("'yes' is not one of: Include, Exclude, Unclear"));
        assert_eq!(session.draft().decision, None);
    }

    #[tokio::test]
    async fn blinded_form_reveals_after_save() {
        let opts = SessionOptions {
            reveal: RevealMode::Blinded,
            ..SessionOptions::default()
        };
        let mut session = ReviewSession::new(sheet(), opts);
        let out = drive(&mut session, "d include\ns\n").await;
        let (before, after) = out.split_once("Saved row 10.").unwrap();
        assert!(!before.contains("AI reason 10"));
        assert!(after.contains("AI reason 10"));
    }

    #[tokio::test]
    async fn blinded_form_refuses_ai_override_before_save() {
        let opts = SessionOptions {
            reveal: RevealMode::Blinded,
            ..SessionOptions::default()
        };
        let mut session = ReviewSession::new(sheet(), opts);
        let out = drive(&mut session, "ai no
why guessed
").await;
        assert_eq!(out.matches("warning: the AI fields stay hidden").count(), 2);
        assert!(session.draft().ai_label.is_none());
        assert!(session.draft().ai_justification.is_none());
    }

    #[tokio::test]
    async fn ai_label_can_be_cleared() {
        let mut session = ReviewSession::new(sheet(), SessionOptions::default());
        drive(&mut session, "ai none
").await;
        assert_eq!(session.draft().ai_label, Some(AiLabel::Absent));
    }

    #[tokio::test]
    async fn next_at_end_stays() {
        let mut session = ReviewSession::new(sheet(), SessionOptions::default());
        drive(&mut session, "n\nn\nn\nn\n").await;
        assert_eq!(session.current().unwrap().row_id, 30);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_not_fatal() {
        let source = sheet();
        source.fail_fetches("bad token");
        let mut session = ReviewSession::new(source, SessionOptions::default());
        let out = drive(&mut session, "n\nq\n").await;
        assert!(out.contains("error: could not load the sheet: remote store error: bad token"));
        assert!(out.contains("(no data: 'r' to retry)"));
    }

    #[tokio::test]
    async fn toggle_to_empty_unreviewed_view() {
        let mut session = ReviewSession::new(sheet(), SessionOptions::default());
        let out = drive(&mut session, "d include\ns\nn\nd exclude\ns\nn\nd unclear\ns\nu\n").await;
        assert!(out.contains("No unreviewed rows."));
    }
}
