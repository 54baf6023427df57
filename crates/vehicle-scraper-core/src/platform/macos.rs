use std::process::Command;

/// `caffeinate` exits on its own if this process dies first
pub fn inhibitor_command() -> Option<Command> {
    let mut command = Command::new("caffeinate");
    command.args(["-dimsu", "-w", &std::process::id().to_string()]);
    Some(command)
}
