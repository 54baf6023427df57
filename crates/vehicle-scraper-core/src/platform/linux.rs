use std::process::Command;

/// Holds a systemd idle/sleep inhibitor lock for as long as the child lives
pub fn inhibitor_command() -> Option<Command> {
    let mut command = Command::new("systemd-inhibit");
    command.args([
        "--what=idle:sleep",
        "--who=vehicle-scraper",
        "--why=Collecting images",
        "--mode=block",
        "sleep",
        "infinity",
    ]);
    Some(command)
}
