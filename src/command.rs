//! Commands shared by the tree items and the host loop.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::preview::SurfaceEvent;

/// Externally invocable actions. All of them are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Re-run README discovery
    RefreshTree,
    /// Show a README in the preview surface
    Preview(PathBuf),
    /// Close the preview surface
    ClosePreview,
    /// Forward a lifecycle or page event to the preview surface
    Surface(SurfaceEvent),
    /// Stop the host loop
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("`preview` needs a file path")]
    MissingPath,
    #[error("`message` needs a JSON payload")]
    MissingMessage,
    #[error("unknown command `{0}`")]
    Unknown(String),
}

impl FromStr for Command {
    type Err = CommandParseError;

    /// Parse a command line such as `refresh` or `preview docs/README.md`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));
        match name {
            "" => Err(CommandParseError::Empty),
            "refresh" => Ok(Self::RefreshTree),
            "preview" | "open" if rest.is_empty() => Err(CommandParseError::MissingPath),
            "preview" | "open" => Ok(Self::Preview(PathBuf::from(rest))),
            "close" => Ok(Self::ClosePreview),
            "show" => Ok(Self::Surface(SurfaceEvent::Visible)),
            "hide" => Ok(Self::Surface(SurfaceEvent::Hidden)),
            "message" if rest.is_empty() => Err(CommandParseError::MissingMessage),
            "message" => Ok(Self::Surface(SurfaceEvent::Message(rest.to_string()))),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!("refresh".parse::<Command>(), Ok(Command::RefreshTree));
        assert_eq!(" close ".parse::<Command>(), Ok(Command::ClosePreview));
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_preview_keeps_spaces_in_path() {
        assert_eq!(
            "preview docs/My Notes/README.md".parse::<Command>(),
            Ok(Command::Preview(PathBuf::from("docs/My Notes/README.md")))
        );
    }

    #[test]
    fn test_parse_surface_events() {
        assert_eq!(
            "show".parse::<Command>(),
            Ok(Command::Surface(SurfaceEvent::Visible))
        );
        assert_eq!(
            "hide".parse::<Command>(),
            Ok(Command::Surface(SurfaceEvent::Hidden))
        );
        assert_eq!(
            r#"message {"command":"refresh"}"#.parse::<Command>(),
            Ok(Command::Surface(SurfaceEvent::Message(
                r#"{"command":"refresh"}"#.to_string()
            )))
        );
        assert_eq!("message".parse::<Command>(), Err(CommandParseError::MissingMessage));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandParseError::Empty));
        assert_eq!("preview".parse::<Command>(), Err(CommandParseError::MissingPath));
        assert_eq!(
            "jump 3".parse::<Command>(),
            Err(CommandParseError::Unknown("jump".to_string()))
        );
    }
}
