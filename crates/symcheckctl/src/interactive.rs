//! Interactive Session - terminal front end for a symptom check
//!
//! Walks one session through symptom entry, the question phase and the
//! plausibility review. Input and output are generic so the whole flow
//! can be driven from a script in tests.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use symcheck_common::plausibility::PlausibilityItem;
use symcheck_common::{
    Answer, AssistStep, Assessment, Description, LabelMap, Navigator, Phase, Question, Report,
    Session, Step, SymcheckError, SymptomId,
};

/// Matches listed per search
const MAX_MATCHES: usize = 15;

/// How a check ended.
#[derive(Debug)]
pub enum Outcome {
    Finished(Report),
    Quit,
}

enum Command {
    Done,
    Quit,
    New,
    Pick(usize),
    Remove(usize),
    Text(String),
}

fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("done") {
        return Command::Done;
    }
    if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("cancel") {
        return Command::Quit;
    }
    if is_new(input) {
        return Command::New;
    }
    if let Some(rest) = input.strip_prefix('-') {
        if let Ok(n) = rest.trim().parse::<usize>() {
            return Command::Remove(n);
        }
    }
    match input.parse::<usize>() {
        Ok(n) => Command::Pick(n),
        Err(_) => Command::Text(input.to_string()),
    }
}

fn is_new(input: &str) -> bool {
    input.eq_ignore_ascii_case("new")
}

/// What came back from an answer prompt.
enum Reply<T> {
    Value(T),
    NewSession,
    Quit,
}

/// Where the flow goes after one phase step.
enum Flow {
    Next(Step),
    NewSession,
    Quit,
}

pub struct Terminal<R, W> {
    input: R,
    out: W,
    spinners: bool,
}

impl Terminal<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            out: io::stdout(),
            spinners: true,
        }
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    /// Terminal over arbitrary streams, without spinners.
    pub fn new(input: R, out: W) -> Self {
        Self {
            input,
            out,
            spinners: false,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Prompt and read one line. `None` on end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "   {}  ", label.bright_magenta())?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn warn(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "   {}  {}", "!".yellow(), msg)
    }

    /// Run `f` under a spinner when attached to a terminal.
    fn spin<T>(&self, msg: &str, f: impl FnOnce() -> T) -> T {
        if !self.spinners {
            return f();
        }
        let spinner = create_spinner(msg);
        let result = f();
        spinner.finish_and_clear();
        result
    }

    fn ask_answer(&mut self) -> io::Result<Reply<Answer>> {
        loop {
            let Some(input) = self.prompt("[y]es / [n]o / [?] don't know:")? else {
                return Ok(Reply::Quit);
            };
            if input.eq_ignore_ascii_case("quit") {
                return Ok(Reply::Quit);
            }
            if is_new(&input) {
                return Ok(Reply::NewSession);
            }
            match input.parse::<Answer>() {
                Ok(answer) => return Ok(Reply::Value(answer)),
                Err(_) => self.warn("Please answer y, n or ? (new starts over)")?,
            }
        }
    }

    fn ask_yes_no(&mut self, label: &str) -> io::Result<Reply<bool>> {
        loop {
            let Some(input) = self.prompt(label)? else {
                return Ok(Reply::Quit);
            };
            match input.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Reply::Value(true)),
                "n" | "no" => return Ok(Reply::Value(false)),
                "quit" | "cancel" => return Ok(Reply::Quit),
                "new" => return Ok(Reply::NewSession),
                _ => self.warn("Please answer y or n (new starts over)")?,
            }
        }
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.magenta} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run a complete check. `preset` symptoms are reported before the first
/// prompt. Typing `new` at any prompt discards the session and returns to
/// symptom entry.
pub fn run_check<R: BufRead, W: Write>(
    nav: &Navigator,
    session: &mut Session,
    term: &mut Terminal<R, W>,
    preset: &[String],
) -> Result<Outcome> {
    for symptom in preset {
        let reported = term.spin("Loading symptoms...", || nav.report_symptom(session, symptom));
        match reported {
            Ok(_) => {}
            Err(SymcheckError::UnknownSymptom(s)) => {
                term.warn(&format!("Unknown symptom: {}", s))?;
            }
            Err(e) if e.is_retryable() => {
                term.warn(&format!("{} ({} not added)", e, symptom))?;
            }
            Err(e) => return Err(e).context("Failed to report symptom"),
        }
    }

    loop {
        let mut step = match collect_symptoms(nav, session, term)? {
            Flow::Next(step) => step,
            Flow::NewSession => {
                start_over(session, term)?;
                continue;
            }
            Flow::Quit => return Ok(Outcome::Quit),
        };

        loop {
            let flow = match step {
                Step::Question(question) => ask_question(nav, session, term, &question)?,
                Step::NoMatchingCondition => {
                    writeln!(term.out)?;
                    writeln!(
                        term.out,
                        "{}  {}",
                        "?".bright_cyan().bold(),
                        "No known condition matches these answers.".bright_white().bold()
                    )?;
                    match term.ask_yes_no("Revise your symptoms? [y/n]:")? {
                        Reply::Value(true) => {
                            nav.revise_input(session)?;
                            break;
                        }
                        Reply::NewSession => Flow::NewSession,
                        Reply::Value(false) | Reply::Quit => Flow::Quit,
                    }
                }
                Step::Review(_) => review_disease(nav, session, term)?,
                Step::Done => {
                    let report = nav.report(session)?;
                    return Ok(Outcome::Finished(report));
                }
            };

            match flow {
                Flow::Next(next) => step = next,
                Flow::NewSession => {
                    start_over(session, term)?;
                    break;
                }
                Flow::Quit => return Ok(Outcome::Quit),
            }
        }
    }
}

fn start_over<R: BufRead, W: Write>(session: &mut Session, term: &mut Terminal<R, W>) -> io::Result<()> {
    session.reset();
    writeln!(term.out)?;
    writeln!(term.out, "   {}  {}", "+".bright_green(), "Started a new session".bright_white())
}

/// Report one symptom. A graph outage is shown and leaves the list as it
/// was; returns whether the symptom was added.
fn add_symptom<R: BufRead, W: Write>(
    nav: &Navigator,
    session: &mut Session,
    term: &mut Terminal<R, W>,
    id: &SymptomId,
) -> Result<bool> {
    let reported = term.spin("Loading symptoms...", || nav.report_symptom(session, id.as_str()));
    match reported {
        Ok(_) => Ok(true),
        Err(e) if e.is_retryable() => {
            term.warn(&format!("{} (symptom not added, try again)", e))?;
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Symptom entry. Returns the first step once the user is done.
fn collect_symptoms<R: BufRead, W: Write>(
    nav: &Navigator,
    session: &mut Session,
    term: &mut Terminal<R, W>,
) -> Result<Flow> {
    writeln!(term.out)?;
    writeln!(
        term.out,
        "{}  {}",
        "?".bright_cyan().bold(),
        "Which symptoms do you have?".bright_white().bold()
    )?;
    writeln!(
        term.out,
        "   {}",
        "(type to search, a number to pick, -N to remove, done to continue, new to start over)".dimmed()
    )?;

    let mut choices: Option<LabelMap<SymptomId>> = None;
    let mut listed: Vec<(String, SymptomId)> = Vec::new();

    loop {
        show_reported(session, term)?;
        let Some(input) = term.prompt("Symptom:")? else {
            return Ok(Flow::Quit);
        };

        match parse_command(&input) {
            Command::Quit => return Ok(Flow::Quit),
            Command::New => return Ok(Flow::NewSession),
            Command::Done => {
                let step = term.spin("Finding candidate conditions...", || nav.finish_input(session));
                match step {
                    Ok(step) => return Ok(Flow::Next(step)),
                    Err(e) if e.is_retryable() => term.warn(&e.to_string())?,
                    Err(e) => return Err(e.into()),
                }
            }
            Command::Remove(n) => {
                let target = session.reported().get(n.wrapping_sub(1)).cloned();
                match target {
                    Some(id) => {
                        nav.withdraw_symptom(session, &id)?;
                        choices = None;
                    }
                    None => term.warn(&format!("No reported symptom number {}", n))?,
                }
            }
            Command::Pick(n) => match listed.get(n.wrapping_sub(1)).cloned() {
                Some((_, id)) => {
                    if add_symptom(nav, session, term, &id)? {
                        listed.clear();
                        choices = None;
                    }
                }
                None => term.warn(&format!("Please pick a number between 1 and {}", listed.len()))?,
            },
            Command::Text(text) => {
                if choices.is_none() {
                    let loaded = term.spin("Loading symptoms...", || nav.symptom_choices(session));
                    match loaded {
                        Ok(map) => choices = Some(map),
                        Err(e) if e.is_retryable() => {
                            term.warn(&e.to_string())?;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                let Some(map) = choices.as_ref() else {
                    continue;
                };

                listed = match map.resolve_label(&text) {
                    Some(id) => vec![(text.clone(), id.clone())],
                    None => map
                        .search(&text)
                        .into_iter()
                        .map(|(label, id)| (label.to_string(), id.clone()))
                        .collect(),
                };

                match listed.len() {
                    0 => term.warn(&format!("No matching symptom for '{}'", text))?,
                    1 => {
                        let (_, id) = listed.remove(0);
                        if add_symptom(nav, session, term, &id)? {
                            choices = None;
                        }
                    }
                    n => {
                        for (i, (label, _)) in listed.iter().take(MAX_MATCHES).enumerate() {
                            writeln!(term.out, "   {}  {}", format!("[{}]", i + 1).cyan(), label)?;
                        }
                        if n > MAX_MATCHES {
                            writeln!(term.out, "   {}", format!("... and {} more", n - MAX_MATCHES).dimmed())?;
                        }
                        listed.truncate(MAX_MATCHES);
                    }
                }
            }
        }
    }
}

fn show_reported<R: BufRead, W: Write>(session: &Session, term: &mut Terminal<R, W>) -> io::Result<()> {
    if session.reported().is_empty() {
        return Ok(());
    }
    let labels: Vec<String> = session
        .reported()
        .iter()
        .enumerate()
        .map(|(i, id)| format!("{}. {}", i + 1, session.label_of(id)))
        .collect();
    writeln!(term.out, "   {}  {}", "+".bright_green(), labels.join("  "))
}

fn ask_question<R: BufRead, W: Write>(
    nav: &Navigator,
    session: &mut Session,
    term: &mut Terminal<R, W>,
    question: &Question,
) -> Result<Flow> {
    writeln!(term.out)?;
    writeln!(
        term.out,
        "{}  {} {}",
        format!("Q{}", question.number).bright_cyan().bold(),
        "Do you have".bright_white(),
        format!("{}?", question.label).bright_white().bold()
    )?;
    writeln!(
        term.out,
        "   {}",
        format!(
            "{} candidate conditions, {} distinguishable",
            session.candidates().len(),
            session.distinct_groups()
        )
        .dimmed()
    )?;

    loop {
        let answer = match term.ask_answer()? {
            Reply::Value(answer) => answer,
            Reply::NewSession => return Ok(Flow::NewSession),
            Reply::Quit => return Ok(Flow::Quit),
        };
        let next = term.spin("Updating candidates...", || nav.answer(session, answer));
        match next {
            Ok(step) => return Ok(Flow::Next(step)),
            Err(e) if e.is_retryable() => {
                term.warn(&format!("{} (your answer was not recorded, try again)", e))?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn review_disease<R: BufRead, W: Write>(
    nav: &Navigator,
    session: &mut Session,
    term: &mut Terminal<R, W>,
) -> Result<Flow> {
    let item = loop {
        let reviewed = term.spin("Looking up the condition...", || nav.review(session).cloned());
        match reviewed {
            Ok(item) => break item,
            Err(e) if e.is_retryable() => {
                term.warn(&e.to_string())?;
                match term.ask_yes_no("Try again? [y/n]:")? {
                    Reply::Value(true) => {}
                    Reply::NewSession => return Ok(Flow::NewSession),
                    Reply::Value(false) | Reply::Quit => return Ok(Flow::Quit),
                }
            }
            Err(e) => return Err(e.into()),
        }
    };
    show_review(&item, session, term)?;

    loop {
        let mut streamed = false;
        let step = {
            let out = &mut term.out;
            let mut sink = |chunk: &str| {
                if !streamed {
                    let _ = write!(out, "   {}  ", "*".bright_magenta());
                }
                let _ = write!(out, "{}", chunk);
                let _ = out.flush();
                streamed = true;
            };
            nav.assistant_turn(session, &mut sink)?
        };
        if streamed {
            writeln!(term.out)?;
        }

        match step {
            AssistStep::Question(question) => {
                if !streamed {
                    writeln!(term.out, "   {}  {}", "*".bright_magenta(), question.bright_white())?;
                }
                let answer = match term.ask_answer()? {
                    Reply::Value(answer) => answer,
                    Reply::NewSession => return Ok(Flow::NewSession),
                    Reply::Quit => return Ok(Flow::Quit),
                };
                nav.answer_assistant(session, answer)?;
            }
            AssistStep::Assessment(assessment) => {
                show_assessment(&assessment, streamed, term)?;
                break;
            }
            AssistStep::Manual => break,
        }
    }

    match term.ask_yes_no("Does this condition match your situation? [y/n]:")? {
        Reply::Value(accept) => Ok(Flow::Next(nav.decide(session, accept)?)),
        Reply::NewSession => Ok(Flow::NewSession),
        Reply::Quit => Ok(Flow::Quit),
    }
}

fn show_review<R: BufRead, W: Write>(
    item: &PlausibilityItem,
    session: &Session,
    term: &mut Terminal<R, W>,
) -> io::Result<()> {
    let position = session.decisions().len() + 1;
    writeln!(term.out)?;
    writeln!(
        term.out,
        "{}  {} {}",
        format!("[{}/{}]", position, session.reviews().len()).cyan(),
        "Possible condition:".bright_white(),
        item.disease.label.bright_white().bold()
    )?;

    let Some(material) = &item.material else {
        return Ok(());
    };
    match &material.description {
        Description::Available { title, text } => {
            writeln!(term.out, "   {}", title.underline())?;
            for line in text.lines() {
                writeln!(term.out, "   {}", line)?;
            }
        }
        Description::NotFound => writeln!(term.out, "   {}", material.description.summary().dimmed())?,
        Description::FetchFailed { .. } => {
            writeln!(term.out, "   {}  {}", "!".yellow(), material.description.summary())?
        }
    }

    if !material.symptoms.is_empty() {
        let labels: Vec<&str> = material.symptoms.iter().map(|(_, l)| l.as_str()).collect();
        writeln!(term.out, "   {} {}", "Typical symptoms:".dimmed(), labels.join(", "))?;
    }
    Ok(())
}

fn show_assessment<R: BufRead, W: Write>(
    assessment: &Assessment,
    streamed: bool,
    term: &mut Terminal<R, W>,
) -> io::Result<()> {
    if !streamed {
        for line in assessment.summary.lines() {
            writeln!(term.out, "   {}", line)?;
        }
    }
    if let Some(severity) = assessment.severity {
        let label = severity.prompt_label();
        if severity.is_critical() {
            writeln!(term.out, "   {}  {}", "!".bright_red().bold(), label.bright_red().bold())?;
        } else {
            writeln!(term.out, "   {}  {}", "-".yellow(), label.yellow())?;
        }
    }
    Ok(())
}

/// Phase name for status lines.
pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::CollectingSymptoms => "entering symptoms",
        Phase::AskingQuestions => "answering questions",
        Phase::PlausibilityCheck => "reviewing conditions",
        Phase::Done => "finished",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert!(matches!(parse_command(""), Command::Done));
        assert!(matches!(parse_command("DONE"), Command::Done));
        assert!(matches!(parse_command("quit"), Command::Quit));
        assert!(matches!(parse_command("New"), Command::New));
        assert!(matches!(parse_command("3"), Command::Pick(3)));
        assert!(matches!(parse_command("-2"), Command::Remove(2)));
        assert!(matches!(parse_command("fev"), Command::Text(t) if t == "fev"));
    }
}
