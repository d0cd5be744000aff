use bytes::Bytes;

/// Literal lines that end a session once the client has a name.
const QUIT_COMMANDS: [&[u8]; 2] = [b"quit", b"/quit"];

/// Meaning of a line sent by the frontend (client) after it has named itself.
///
/// The first line of a session is always a username and is never classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// `quit` or `/quit`, matched exactly.
    Quit,
    /// Anything else, broadcast verbatim.
    Text(Bytes),
}

impl ClientLine {
    /// Classifies a line with its delimiter already stripped.
    pub fn parse(line: Bytes) -> Self {
        if QUIT_COMMANDS.iter().any(|quit| *quit == &line[..]) {
            ClientLine::Quit
        } else {
            ClientLine::Text(line)
        }
    }
}
