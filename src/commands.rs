use crate::router::Route;

/// Available commands and autocomplete logic
#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "home",
    aliases: &["h", "start"],
    description: "Start screen",
  },
  Command {
    name: "users",
    aliases: &["u", "user"],
    description: "Browse users",
  },
  Command {
    name: "tasks",
    aliases: &["t", "task"],
    description: "Browse tasks",
  },
  Command {
    name: "new-user",
    aliases: &["nu", "adduser"],
    description: "Create a user",
  },
  Command {
    name: "new-task",
    aliases: &["nt", "addtask"],
    description: "Create a task",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Refetch everything on screen",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit taskdeck",
  },
];

/// What a submitted command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
  Navigate(Route),
  Refresh,
  Quit,
}

/// Resolve a submitted command line.
///
/// Input containing `/` is treated as a path (`:tasks/7`, `:/users/new`).
pub fn resolve(input: &str) -> CommandAction {
  let input = input.trim();
  if input.contains('/') {
    return CommandAction::Navigate(Route::parse(input));
  }

  match input.to_lowercase().as_str() {
    "home" => CommandAction::Navigate(Route::Home),
    "users" => CommandAction::Navigate(Route::Users),
    "tasks" => CommandAction::Navigate(Route::Tasks),
    "new-user" => CommandAction::Navigate(Route::UserCreate),
    "new-task" => CommandAction::Navigate(Route::TaskCreate),
    "refresh" => CommandAction::Refresh,
    "quit" => CommandAction::Quit,
    other => CommandAction::Navigate(Route::parse(other)),
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  // Paths are not completed
  if input_lower.contains('/') {
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
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
