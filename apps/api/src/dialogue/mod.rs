//! Chat dialogue: a per-chat state machine that collects search parameters step by step.
//!
//! The machine never talks to the sources itself. A `/search` transition hands the
//! collected [`SearchQuery`] back to the caller through [`Action::Search`].

pub mod handlers;
pub mod render;

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DialogueConfig;
use crate::models::SearchQuery;
use crate::vocabulary::{load_salary_brackets, VocabularyError, VocabularyIndex, VocabularyStore};

const START_MENU: &str = "Hello! I can find resumes matching the parameters you provide.\n\
Choose your option:\n\
/keywords - search query\n\
/region - region\n\
/salary - salary range\n\
/experience - required experience\n\
/search - start searching\n\
/clear - clear all parameters";
const IDLE_HINT: &str = "You're not setting any parameter right now. Type one of the commands: \
/keywords, /region, /salary, /experience, /search, /clear";
const NO_SESSION_HINT: &str = "Please type /start to make a request.";
const CHOOSE_OPTION_HINT: &str = "Please choose one of the offered options.";

const SALARY_FROM_PREFIX: &str = "salary_from:";
const SALARY_TO_PREFIX: &str = "salary_to:";
const EXPERIENCE_PREFIX: &str = "experience:";
const EXPERIENCE_RESET: &str = "experience_reset";
const EXPERIENCE_COMPLETE: &str = "experience_complete";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    CollectingKeywords,
    CollectingRegion,
    CollectingSalaryFrom,
    CollectingSalaryTo,
    CollectingExperience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Clear,
    Keywords,
    Region,
    Salary,
    Experience,
    Search,
}

impl FromStr for Command {
    type Err = String;

    /// Accepts `/name`, `/name@bot` and trailing arguments, which are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.split_whitespace().next().unwrap_or_default();
        let name = word
            .strip_prefix('/')
            .ok_or_else(|| format!("not a command: {s}"))?;
        let name = name.split('@').next().unwrap_or_default();

        match name.to_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "clear" => Ok(Command::Clear),
            "keywords" => Ok(Command::Keywords),
            "region" => Ok(Command::Region),
            "salary" => Ok(Command::Salary),
            "experience" => Ok(Command::Experience),
            "search" => Ok(Command::Search),
            other => Err(format!("unknown command: /{other}")),
        }
    }
}

/// What the user sent: a typed message or the data of a pressed option.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    Text(String),
    Choice(String),
}

impl Input {
    fn command(&self) -> Option<Result<Command, String>> {
        match self {
            Input::Text(text) if text.trim_start().starts_with('/') => Some(text.trim().parse()),
            _ => None,
        }
    }
}

/// A selectable option offered with a reply. `choice` is sent back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyOption {
    pub label: String,
    pub choice: String,
}

impl ReplyOption {
    fn new(label: impl Into<String>, choice: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            choice: choice.into(),
        }
    }
}

/// Side effect the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Search(SearchQuery),
    EndSession,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub message: String,
    pub options: Vec<ReplyOption>,
    #[serde(skip)]
    pub action: Option<Action>,
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    fn with_options(mut self, options: Vec<ReplyOption>) -> Self {
        self.options = options;
        self
    }

    fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

/// Option lists offered by `/salary` and `/experience`.
#[derive(Debug, Clone, Default)]
pub struct DialogueOptions {
    /// Display label → salary amount.
    pub salary_from: VocabularyIndex,
    pub salary_to: VocabularyIndex,
    /// Experience labels, in file order of their keys.
    pub experience: Vec<String>,
}

impl DialogueOptions {
    /// Salary brackets come from a two-section file; experience options from a
    /// `{key: label}` object whose labels become search tags.
    pub async fn load(config: &DialogueConfig) -> Result<Self, VocabularyError> {
        let (salary_from, salary_to) = load_salary_brackets(&config.salary_path).await;
        let experience = VocabularyStore::new(&config.experience_path)
            .load()
            .await?
            .iter()
            .map(|(_, label)| label.to_string())
            .collect();

        Ok(Self {
            salary_from,
            salary_to,
            experience,
        })
    }
}

/// One chat's progress through the dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    state: DialogueState,
    draft: SearchQuery,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn draft(&self) -> &SearchQuery {
        &self.draft
    }

    pub fn handle(&mut self, input: Input, options: &DialogueOptions) -> Reply {
        match input.command() {
            Some(Ok(command)) => return self.on_command(command, options),
            Some(Err(e)) => return Reply::text(format!("Sorry, {e}.\n{IDLE_HINT}")),
            None => {}
        }

        match input {
            Input::Text(text) => self.on_text(text),
            Input::Choice(choice) => self.on_choice(&choice, options),
        }
    }

    fn on_command(&mut self, command: Command, options: &DialogueOptions) -> Reply {
        match command {
            Command::Start => {
                self.reset();
                Reply::text(START_MENU)
            }
            Command::Clear => {
                self.reset();
                Reply::text("All parameters cleared. Now you can provide new parameters.")
            }
            Command::Stop => {
                self.reset();
                Reply::text("Goodbye! Hope I was helpful.").with_action(Action::EndSession)
            }
            Command::Keywords => {
                self.state = DialogueState::CollectingKeywords;
                Reply::text("Please provide your search query.")
            }
            Command::Region => {
                self.state = DialogueState::CollectingRegion;
                Reply::text("Please provide your desired region.")
            }
            Command::Salary => {
                if options.salary_from.is_empty() {
                    self.state = DialogueState::Idle;
                    return Reply::text("Salary options are not available right now.");
                }
                self.state = DialogueState::CollectingSalaryFrom;
                Reply::text("Select the minimum salary:")
                    .with_options(salary_options(&options.salary_from, SALARY_FROM_PREFIX))
            }
            Command::Experience => {
                if options.experience.is_empty() {
                    self.state = DialogueState::Idle;
                    return Reply::text("Experience options are not available right now.");
                }
                self.state = DialogueState::CollectingExperience;
                Reply::text("Please choose your experience levels (you can select multiple):")
                    .with_options(self.experience_options(options))
            }
            Command::Search => {
                self.state = DialogueState::Idle;
                if self.draft.validate().is_err() {
                    return Reply::text("Please provide at least keywords. Use /keywords.");
                }
                Reply::text(format!("Searching for '{}'...", self.draft.keywords.trim()))
                    .with_action(Action::Search(self.draft.clone()))
            }
        }
    }

    fn on_text(&mut self, text: String) -> Reply {
        let value = text.trim().to_string();
        match self.state {
            DialogueState::Idle => Reply::text(IDLE_HINT),
            DialogueState::CollectingKeywords | DialogueState::CollectingRegion if value.is_empty() => {
                Reply::text("The value can't be empty, please try again.")
            }
            DialogueState::CollectingKeywords => {
                self.state = DialogueState::Idle;
                let reply = Reply::text(format!("Search query set to: {value}"));
                self.draft.keywords = value;
                reply
            }
            DialogueState::CollectingRegion => {
                self.state = DialogueState::Idle;
                let reply = Reply::text(format!("Region set to: {value}"));
                self.draft.region = Some(value);
                reply
            }
            DialogueState::CollectingSalaryFrom
            | DialogueState::CollectingSalaryTo
            | DialogueState::CollectingExperience => Reply::text(CHOOSE_OPTION_HINT),
        }
    }

    fn on_choice(&mut self, choice: &str, options: &DialogueOptions) -> Reply {
        match self.state {
            DialogueState::CollectingSalaryFrom => match parse_salary(choice, SALARY_FROM_PREFIX) {
                Some(amount) => {
                    self.draft.salary_from = Some(amount);
                    self.state = DialogueState::CollectingSalaryTo;
                    Reply::text("Select the maximum salary:")
                        .with_options(salary_options(&options.salary_to, SALARY_TO_PREFIX))
                }
                None => Reply::text(CHOOSE_OPTION_HINT),
            },
            DialogueState::CollectingSalaryTo => match parse_salary(choice, SALARY_TO_PREFIX) {
                Some(amount) => {
                    self.draft.salary_to = Some(amount);
                    self.state = DialogueState::Idle;
                    Reply::text("Salary range set successfully.")
                }
                None => Reply::text(CHOOSE_OPTION_HINT),
            },
            DialogueState::CollectingExperience => self.on_experience_choice(choice, options),
            _ => Reply::text(format!("That option is no longer active.\n{IDLE_HINT}")),
        }
    }

    fn on_experience_choice(&mut self, choice: &str, options: &DialogueOptions) -> Reply {
        match choice {
            EXPERIENCE_COMPLETE => {
                self.state = DialogueState::Idle;
                Reply::text(format!(
                    "Experience selection completed: {}.",
                    self.selected_experience()
                ))
            }
            EXPERIENCE_RESET => {
                self.draft.experience_tags.clear();
                Reply::text("Experience options have been reset. Please select again.")
                    .with_options(self.experience_options(options))
            }
            _ => {
                let Some(label) = choice
                    .strip_prefix(EXPERIENCE_PREFIX)
                    .filter(|label| options.experience.iter().any(|known| known == label))
                else {
                    return Reply::text(CHOOSE_OPTION_HINT)
                        .with_options(self.experience_options(options));
                };

                if !self.draft.experience_tags.remove(label) {
                    self.draft.experience_tags.insert(label.to_string());
                }
                Reply::text(format!(
                    "Experience options selected: {}\nYou can toggle options, reset, or complete your selection.",
                    self.selected_experience()
                ))
                .with_options(self.experience_options(options))
            }
        }
    }

    fn experience_options(&self, options: &DialogueOptions) -> Vec<ReplyOption> {
        let mut buttons: Vec<ReplyOption> = options
            .experience
            .iter()
            .map(|label| {
                let shown = if self.draft.experience_tags.contains(label) {
                    format!("✅ {label}")
                } else {
                    label.clone()
                };
                ReplyOption::new(shown, format!("{EXPERIENCE_PREFIX}{label}"))
            })
            .collect();
        buttons.push(ReplyOption::new("🔄 Reset", EXPERIENCE_RESET));
        buttons.push(ReplyOption::new("✔️ Complete", EXPERIENCE_COMPLETE));
        buttons
    }

    fn selected_experience(&self) -> String {
        if self.draft.experience_tags.is_empty() {
            "None".to_string()
        } else {
            self.draft
                .experience_tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Routes one input to the chat's session, creating it on `/start` and dropping it
/// on `/stop`. Input for an unknown chat only gets a hint.
pub fn dispatch(
    sessions: &mut HashMap<String, Session>,
    chat_id: &str,
    input: Input,
    options: &DialogueOptions,
) -> Reply {
    if !sessions.contains_key(chat_id) {
        if input.command() != Some(Ok(Command::Start)) {
            return Reply::text(NO_SESSION_HINT);
        }
        sessions.insert(chat_id.to_string(), Session::new());
    }

    let Some(session) = sessions.get_mut(chat_id) else {
        return Reply::text(NO_SESSION_HINT);
    };
    let reply = session.handle(input, options);
    if reply.action == Some(Action::EndSession) {
        sessions.remove(chat_id);
    }
    reply
}

/// Options in ascending amount order; unparsable amounts go last.
fn salary_options(index: &VocabularyIndex, prefix: &str) -> Vec<ReplyOption> {
    let mut entries: Vec<(&str, &str)> = index.iter().collect();
    entries.sort_by_key(|(_, amount)| amount.trim().parse::<u64>().unwrap_or(u64::MAX));
    entries
        .into_iter()
        .map(|(label, amount)| ReplyOption::new(label, format!("{prefix}{amount}")))
        .collect()
}

fn parse_salary(choice: &str, prefix: &str) -> Option<u32> {
    choice.strip_prefix(prefix)?.trim().parse().ok()
}
