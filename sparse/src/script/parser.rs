use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{digit1, multispace0, multispace1},
    combinator::{map, map_res, value},
    sequence::{preceded, terminated, tuple},
};

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::script::ast::Command;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

pub fn parse_command(input: &str) -> anyhow::Result<Command> {
    let (remaining, cmd) = terminated(command, multispace0)(input)
        .map_err(|e| anyhow::anyhow!("Parse error: {}", e))?;
    if !remaining.is_empty() {
        anyhow::bail!("Parse error: unexpected trailing input {:?}", remaining)
    }
    Ok(cmd)
}

/// Parses one command per line. Blank lines and lines starting with `#` are skipped.
pub fn parse_script(input: &str) -> Result<Vec<Command>, ScriptError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            parse_command(line).map_err(|e| ScriptError::Syntax {
                line: n + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

pub fn load_script<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Command>> {
    let path = path.as_ref();
    let script =
        fs::read_to_string(path).with_context(|| format!("reading script {:?}", path))?;
    Ok(parse_script(&script)?)
}

fn command(input: &str) -> IResult<&str, Command> {
    preceded(
        multispace0,
        alt((
            add_command,
            map(indexed("clone"), |index| Command::Clone { index }),
            map(indexed("remove"), |index| Command::Remove { index }),
            map(indexed("at"), |index| Command::At { index }),
            value(Command::Pack, tag_no_case("pack")),
            value(Command::Clear, tag_no_case("clear")),
            value(Command::List, tag_no_case("list")),
            value(Command::Size, tag_no_case("size")),
            value(Command::Stats, tag_no_case("stats")),
        )),
    )(input)
}

fn add_command(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_no_case("add")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, label) = take_while1(|c: char| !c.is_whitespace())(input)?;
    Ok((input, Command::add(label)))
}

fn indexed<'a>(keyword: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, usize> {
    preceded(
        tuple((tag_no_case(keyword), multispace1)),
        map_res(digit1, |digits: &str| digits.parse::<usize>()),
    )
}
