//! Line commands accepted by the interactive session.

use std::str::FromStr;

use crate::error::AppError;
use crate::model::{Score, Semester, TestType};

pub const HELP: &str = "\
Commands:
  subject <name>      select a subject from the catalog
  type <test type>    Regular, Midterm, Final or Term Exam
  semester <term>     Term I or Term II (also 1 or 2)
  score <n>           score between 0 and 10
  record              append the current selection to the score log
  averages            weighted average per semester and subject
  show                show the current selection
  subjects            list the subject catalog
  help                show this text
  quit                leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    Subject(String),
    TestType(TestType),
    Semester(Semester),
    Score(Score),
    Record,
    Averages,
    Show,
    Subjects,
    Help,
    Quit,
}

impl FromStr for FormCommand {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        match word.to_lowercase().as_str() {
            "subject" => Ok(FormCommand::Subject(
                argument(word, rest, "subject name")?.to_string(),
            )),
            "type" | "test-type" | "test" => Ok(FormCommand::TestType(
                argument(word, rest, "test type")?.parse()?,
            )),
            "semester" | "term" => Ok(FormCommand::Semester(
                argument(word, rest, "semester")?.parse()?,
            )),
            "score" => Ok(FormCommand::Score(argument(word, rest, "score")?.parse()?)),
            "record" | "r" => Ok(FormCommand::Record),
            "averages" | "average" | "avg" | "a" => Ok(FormCommand::Averages),
            "show" => Ok(FormCommand::Show),
            "subjects" => Ok(FormCommand::Subjects),
            "help" | "h" | "?" => Ok(FormCommand::Help),
            "quit" | "exit" | "q" => Ok(FormCommand::Quit),
            "" => Err(AppError::Input("empty command".into())),
            other => Err(AppError::Input(format!(
                "unknown command '{other}' (type 'help')"
            ))),
        }
    }
}

fn argument<'a>(word: &str, rest: &'a str, what: &str) -> Result<&'a str, AppError> {
    if rest.is_empty() {
        Err(AppError::Input(format!("'{word}' needs a {what}")))
    } else {
        Ok(rest)
    }
}
