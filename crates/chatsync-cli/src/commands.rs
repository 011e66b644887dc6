//! Slash-command parsing.
//!
//! A submitted line either starts with `/` and names a command, or is a
//! message for the active room.

use chatsync_proto::{RoomId, UserId};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/open <room>`
    Open {
        /// Room to open
        room_id: RoomId,
    },
    /// `/dm <user>`
    Direct {
        /// Other participant
        user_id: UserId,
    },
    /// `/group <name> [member...]`
    Group {
        /// Group name
        name: String,
        /// Members besides the creator
        members: Vec<UserId>,
    },
    /// `/leave [room]`, active room if omitted
    Leave {
        /// Room to leave
        room_id: Option<RoomId>,
    },
    /// `/delete [room]`, active room if omitted
    Delete {
        /// Room to delete
        room_id: Option<RoomId>,
    },
    /// `/close`
    Close,
    /// `/rooms`
    Rooms,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Plain text
    Message {
        /// Message body
        text: String,
    },
    /// Unrecognized command
    Unknown {
        /// Command name as typed
        input: String,
    },
    /// Known command with bad arguments
    InvalidArgs {
        /// Command name
        command: &'static str,
        /// What is wrong
        error: &'static str,
    },
}

/// One-line usage summary.
pub const HELP: &str = "/open <room>  /dm <user>  /group <name> [members]  /leave [room]  \
                        /delete [room]  /close  /rooms  /quit";

/// Parse a submitted line.
pub fn parse(line: &str) -> Command {
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message { text: line.to_string() };
    };

    let mut words = rest.split_whitespace();
    let Some(name) = words.next() else {
        return Command::Unknown { input: String::new() };
    };

    match name {
        "open" | "o" => match words.next() {
            Some(room) => Command::Open { room_id: RoomId::from(room) },
            None => Command::InvalidArgs { command: "open", error: "missing room id" },
        },
        "dm" => match words.next() {
            Some(user) => Command::Direct { user_id: UserId::from(user) },
            None => Command::InvalidArgs { command: "dm", error: "missing user id" },
        },
        "group" => match words.next() {
            Some(group) => Command::Group {
                name: group.to_string(),
                members: words.map(UserId::from).collect(),
            },
            None => Command::InvalidArgs { command: "group", error: "missing group name" },
        },
        "leave" => Command::Leave { room_id: words.next().map(RoomId::from) },
        "delete" => Command::Delete { room_id: words.next().map(RoomId::from) },
        "close" => Command::Close,
        "rooms" | "r" => Command::Rooms,
        "help" | "h" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => Command::Unknown { input: other.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse("hello /there"), Command::Message { text: "hello /there".into() });
    }

    #[test]
    fn room_commands() {
        assert_eq!(parse("/open g1"), Command::Open { room_id: RoomId::from("g1") });
        assert_eq!(parse("/o  g1 "), Command::Open { room_id: RoomId::from("g1") });
        assert_eq!(parse("/leave"), Command::Leave { room_id: None });
        assert_eq!(parse("/delete g2"), Command::Delete { room_id: Some(RoomId::from("g2")) });
        assert_eq!(parse("/dm ann"), Command::Direct { user_id: UserId::from("ann") });
    }

    #[test]
    fn group_takes_name_then_members() {
        assert_eq!(parse("/group team ann bob"), Command::Group {
            name: "team".into(),
            members: vec![UserId::from("ann"), UserId::from("bob")],
        });
        assert_eq!(parse("/group team"), Command::Group { name: "team".into(), members: vec![] });
    }

    #[test]
    fn missing_arguments_are_reported() {
        assert_eq!(parse("/open"), Command::InvalidArgs {
            command: "open",
            error: "missing room id"
        });
        assert_eq!(parse("/group"), Command::InvalidArgs {
            command: "group",
            error: "missing group name"
        });
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(parse("/frobnicate"), Command::Unknown { input: "frobnicate".into() });
        assert_eq!(parse("/"), Command::Unknown { input: String::new() });
    }
}
