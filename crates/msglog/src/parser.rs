//! Message line parser using nom
//!
//! Line format:
//! ```text
//! identifier time_sent sender receiver content delivered
//! ```
//!
//! Fields are whitespace-delimited; `delivered` is an integer where any
//! non-zero value means delivered.

use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{eof, map_res, opt, peek, recognize},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::Result;
use crate::message::Message;

fn identifier(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(input)
}

fn signed(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

type Fields<'a> = (u64, i64, &'a str, &'a str, &'a str, i64);

fn fields(input: &str) -> IResult<&str, Fields<'_>> {
    terminated(
        tuple((
            preceded(multispace0, identifier),
            preceded(multispace1, signed),
            preceded(multispace1, token),
            preceded(multispace1, token),
            preceded(multispace1, token),
            preceded(multispace1, signed),
        )),
        pair(multispace0, eof),
    )(input)
}

/// Parse a full message line (without trailing newline)
pub fn parse_message(line: &str) -> Result<Message> {
    let (_, (id, time_sent, sender, receiver, content, delivered)) = fields(line)?;

    Ok(Message {
        id,
        time_sent,
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        content: content.to_string(),
        delivered: delivered != 0,
    })
}

/// Parse only the leading identifier of a line
///
/// Returns `None` when the line does not start with an identifier token.
/// The rest of the line is not inspected.
pub fn parse_identifier(line: &str) -> Option<u64> {
    let result: IResult<&str, u64> = preceded(
        multispace0,
        terminated(identifier, peek(alt((multispace1, eof)))),
    )(line);
    result.ok().map(|(_, id)| id)
}

/// Format a message as a single log line (no trailing newline)
pub fn format_message(msg: &Message) -> String {
    format!(
        "{} {} {} {} {} {}",
        msg.id,
        msg.time_sent,
        msg.sender,
        msg.receiver,
        msg.content,
        u8::from(msg.delivered)
    )
}
