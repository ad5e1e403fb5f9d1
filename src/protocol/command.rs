use std::str;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty record")]
    Empty,
    #[error("record is not valid UTF-8")]
    InvalidUtf8,
    #[error("unknown verb '{0}'")]
    UnknownVerb(String),
    #[error("missing topic")]
    MissingTopic,
}

/// One parsed client command.
///
/// Grammar: `VERB SP TOPIC [SP PAYLOAD]`. The topic is a single
/// whitespace-free token; the payload is the remainder of the record and may
/// contain spaces. Topic length is not validated here — the registry owns
/// that bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe { topic: String },
    Publish { topic: String, payload: String },
}

impl Command {
    /// Parses one framed record.
    ///
    /// Anything after the topic token of a `SUBSCRIBE` is ignored. A
    /// `PUBLISH` without a payload publishes the empty string.
    pub fn parse(record: &[u8]) -> Result<Self, CommandError> {
        let text = str::from_utf8(record).map_err(|_| CommandError::InvalidUtf8)?;
        if text.trim().is_empty() {
            return Err(CommandError::Empty);
        }

        let (verb, rest) = match text.split_once(' ') {
            Some((verb, rest)) => (verb, rest),
            None => (text, ""),
        };

        match verb {
            "SUBSCRIBE" => {
                let topic = rest
                    .split_whitespace()
                    .next()
                    .ok_or(CommandError::MissingTopic)?;
                Ok(Command::Subscribe {
                    topic: topic.to_string(),
                })
            }
            "PUBLISH" => {
                let (topic, payload) = match rest.split_once(' ') {
                    Some((topic, payload)) => (topic, payload),
                    None => (rest, ""),
                };
                if topic.is_empty() {
                    return Err(CommandError::MissingTopic);
                }
                Ok(Command::Publish {
                    topic: topic.to_string(),
                    payload: payload.to_string(),
                })
            }
            other => Err(CommandError::UnknownVerb(other.to_string())),
        }
    }
}
