/// Available commands and autocomplete logic
use crate::router::Route;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Path the command navigates to, `None` for quit
  pub path: Option<&'static str>,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "students",
    aliases: &["s", "student", "list"],
    description: "Browse students",
    path: Some("/students"),
  },
  Command {
    name: "add",
    aliases: &["a", "new", "create"],
    description: "Add a student",
    path: Some("/students/add"),
  },
  Command {
    name: "dashboard",
    aliases: &["d", "home"],
    description: "Overview",
    path: Some("/"),
  },
  Command {
    name: "about",
    aliases: &["info", "version"],
    description: "About rollcall",
    path: Some("/about"),
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit rollcall",
    path: None,
  },
];

/// What a submitted command line asks the app to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTarget {
  Navigate(Route),
  Quit,
}

/// Resolve submitted input: a `/path` is routed directly, anything else
/// must name a command or alias exactly.
pub fn resolve(input: &str) -> Option<CommandTarget> {
  let input = input.trim();
  if input.starts_with('/') {
    return Some(CommandTarget::Navigate(Route::parse(input)));
  }

  let input_lower = input.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input_lower || cmd.aliases.contains(&input_lower.as_str()))
    .map(|cmd| match cmd.path {
      Some(path) => CommandTarget::Navigate(Route::parse(path)),
      None => CommandTarget::Quit,
    })
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  // Paths are typed verbatim
  if input_lower.starts_with('/') {
    return Vec::new();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
