use std::fmt;

/// 指令前綴
pub const COMMAND_PREFIX: char = '!';

/// Every command the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Blast { target: String, message: String },
    GetGroupId { invite_link: String },
    AddUser { number: String, expiry: String },
    EditUser { number: String, expiry: String },
    DeleteUser { number: String },
    Report,
}

impl Command {
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Start => "!start",
            Command::Blast { .. } => "!blast",
            Command::GetGroupId { .. } => "!getidgrup",
            Command::AddUser { .. } => "!adduser",
            Command::EditUser { .. } => "!edituser",
            Command::DeleteUser { .. } => "!deluser",
            Command::Report => "!laporan",
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::AddUser { .. }
                | Command::EditUser { .. }
                | Command::DeleteUser { .. }
                | Command::Report
        )
    }
}

/// A known command with missing arguments. Carries the usage line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageError {
    pub usage: &'static str,
    /// Usage of an admin command is not shown to other users.
    pub admin_only: bool,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Format salah. Gunakan: {}", self.usage)
    }
}

impl std::error::Error for UsageError {}

/// Parses a message body.
///
/// Returns `Ok(None)` for anything that is not a known command so ordinary
/// chat messages are ignored. Arguments are separated by single spaces; the
/// blast message is the verbatim remainder, so newlines survive.
pub fn parse_command(body: &str) -> Result<Option<Command>, UsageError> {
    let (keyword, rest) = body
        .trim_start()
        .split_once(|c: char| c.is_whitespace())
        .unwrap_or((body.trim(), ""));
    let keyword = keyword.to_lowercase();

    if !keyword.starts_with(COMMAND_PREFIX) {
        return Ok(None);
    }

    let command = match keyword.as_str() {
        "!start" => Command::Start,
        "!blast" => {
            let (target, message) = split_first(rest);
            if target.is_empty() || message.trim().is_empty() {
                return Err(UsageError {
                    usage: "!blast {id_grup/nama_file} {pesan}",
                    admin_only: false,
                });
            }
            Command::Blast {
                target: target.to_string(),
                message: message.to_string(),
            }
        }
        "!getidgrup" => {
            let (link, _) = split_first(rest);
            if link.is_empty() {
                return Err(UsageError {
                    usage: "!getidgrup {link_grup}",
                    admin_only: false,
                });
            }
            Command::GetGroupId {
                invite_link: link.to_string(),
            }
        }
        "!adduser" | "!edituser" => {
            let (number, remainder) = split_first(rest);
            let (expiry, _) = split_first(remainder);
            if number.is_empty() || expiry.is_empty() {
                return Err(UsageError {
                    usage: if keyword == "!adduser" {
                        "!adduser {nomor} {expired}"
                    } else {
                        "!edituser {nomor} {expired}"
                    },
                    admin_only: true,
                });
            }
            let (number, expiry) = (number.to_string(), expiry.to_lowercase());
            if keyword == "!adduser" {
                Command::AddUser { number, expiry }
            } else {
                Command::EditUser { number, expiry }
            }
        }
        "!deluser" => {
            let (number, _) = split_first(rest);
            if number.is_empty() {
                return Err(UsageError {
                    usage: "!deluser {nomor}",
                    admin_only: true,
                });
            }
            Command::DeleteUser {
                number: number.to_string(),
            }
        }
        "!laporan" => Command::Report,
        _ => return Ok(None),
    };

    Ok(Some(command))
}

fn split_first(input: &str) -> (&str, &str) {
    let input = input.trim_start_matches(' ');
    match input.split_once(' ') {
        Some((head, tail)) => (head.trim(), tail),
        None => (input.trim(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_messages_are_ignored() {
        assert_eq!(parse_command("halo semua"), Ok(None));
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("!unknown arg"), Ok(None));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        assert_eq!(parse_command("!START"), Ok(Some(Command::Start)));
        assert_eq!(parse_command("!start\nhalo"), Ok(Some(Command::Start)));
        assert_eq!(parse_command("!Laporan"), Ok(Some(Command::Report)));
    }

    #[test]
    fn test_blast_keeps_message_verbatim() {
        let command = parse_command("!blast 1203@g.us Halo  semua\nbaris kedua").unwrap();
        assert_eq!(
            command,
            Some(Command::Blast {
                target: "1203@g.us".to_string(),
                message: "Halo  semua\nbaris kedua".to_string(),
            })
        );
    }

    #[test]
    fn test_blast_requires_target_and_message() {
        let err = parse_command("!blast nomor.txt").unwrap_err();
        assert!(err.to_string().contains("!blast {id_grup/nama_file} {pesan}"));
        assert!(parse_command("!blast nomor.txt   ").is_err());
    }

    #[test]
    fn test_user_commands() {
        assert_eq!(
            parse_command("!adduser 0812-345 7HARI"),
            Ok(Some(Command::AddUser {
                number: "0812-345".to_string(),
                expiry: "7hari".to_string(),
            }))
        );
        assert!(parse_command("!edituser 0812").is_err());
        assert_eq!(
            parse_command("!deluser 0812"),
            Ok(Some(Command::DeleteUser {
                number: "0812".to_string()
            }))
        );
        assert!(parse_command("!deluser").unwrap_err().admin_only);
    }

    #[test]
    fn test_admin_only_commands() {
        assert!(Command::Report.requires_admin());
        assert!(!Command::Start.requires_admin());
        assert!(!Command::GetGroupId {
            invite_link: String::new()
        }
        .requires_admin());
    }
}
