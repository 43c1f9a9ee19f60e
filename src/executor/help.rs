//! Help text for console commands

use crate::error::Result;
use crate::grammar::Grammar;

/// Help entry for one command keyword
#[derive(Debug, Clone, Copy)]
pub struct CommandHelp {
    pub name: &'static str,
    pub summary: &'static str,
    pub syntax: &'static str,
    pub description: &'static str,
}

pub static COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "discover",
        summary: "Search the network for devices",
        syntax: "discover",
        description: "Multicasts a search and caches every device that answers.",
    },
    CommandHelp {
        name: "devices",
        summary: "List known devices",
        syntax: "devices [device] [-all | -props | -group-by EPC | EPC:value | EPC | propertyAlias]...",
        description: "Shows operation status, installation location and the primary properties \
                      of each class by default. -all shows every cached property, -props every \
                      property with a known name, EPC only the listed ones. EPC:value and \
                      property aliases filter devices by value.",
    },
    CommandHelp {
        name: "list",
        summary: "Same as devices",
        syntax: "list [device] [options]...",
        description: "See 'help devices'.",
    },
    CommandHelp {
        name: "get",
        summary: "Read properties from a device",
        syntax: "get <device> EPC... [-skip-validation]",
        description: "Asks the device for the given EPCs. -skip-validation also queries \
                      devices discovery has not seen yet.",
    },
    CommandHelp {
        name: "set",
        summary: "Write properties to a device",
        syntax: "set <device> (EPC:hex | EPC:valueAlias | propertyAlias)...",
        description: "Example: set ac 80:on b0:cooling",
    },
    CommandHelp {
        name: "update",
        summary: "Refresh cached properties",
        syntax: "update [device] [-force]",
        description: "Refreshes devices whose cache is older than a minute, or all of them \
                      with -force.",
    },
    CommandHelp {
        name: "alias",
        summary: "Manage device aliases",
        syntax: "alias [<name> [<device> [property]...] | -delete <name>]",
        description: "Without arguments lists aliases; with a name shows its device; with a \
                      device binds the name to the single device matching it.",
    },
    CommandHelp {
        name: "group",
        summary: "Manage device groups",
        syntax: "group add|remove @name <device>... | group delete @name | group list [@name]",
        description: "Groups can be used wherever a device is expected, e.g. set @living off.",
    },
    CommandHelp {
        name: "debug",
        summary: "Show or toggle debug mode",
        syntax: "debug [on | off]",
        description: "Debug mode logs every command sent to devices.",
    },
    CommandHelp {
        name: "help",
        summary: "Show help",
        syntax: "help [command]",
        description: "",
    },
    CommandHelp {
        name: "quit",
        summary: "Leave the console",
        syntax: "quit",
        description: "",
    },
];

pub fn find(name: &str) -> Option<&'static CommandHelp> {
    COMMANDS.iter().find(|entry| entry.name == name)
}

/// Render help for one command, or the overview in grammar order
pub fn render(grammar: &Grammar, topic: Option<&str>) -> Result<String> {
    if let Some(topic) = topic {
        let Some(entry) = find(topic) else {
            return Ok(format!("Unknown command '{topic}'. Type 'help' for a list."));
        };
        let mut text = format!("{}\n\n  {}\n", entry.summary, entry.syntax);
        if !entry.description.is_empty() {
            text.push_str(&format!("\n{}\n", entry.description));
        }
        return Ok(text);
    }

    let names = grammar.command_names()?;
    let width = names.iter().map(|name| name.len()).max().unwrap_or(0);
    let mut text = String::from("Commands:\n");
    for name in names {
        let summary = find(name).map(|entry| entry.summary).unwrap_or_default();
        text.push_str(&format!("  {name:<width$}  {summary}\n"));
    }
    text.push_str("\nType 'help <command>' for details.");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_has_help() {
        let grammar = Grammar::new();
        let names = grammar.command_names().unwrap();
        for name in &names {
            assert!(find(name).is_some(), "no help for '{name}'");
        }
        for entry in COMMANDS {
            assert!(names.contains(&entry.name), "help for unknown '{}'", entry.name);
        }
    }

    #[test]
    fn test_render_topic() {
        let grammar = Grammar::new();
        let text = render(&grammar, Some("set")).unwrap();
        assert!(text.contains("set <device>"));
        assert!(render(&grammar, Some("frobnicate")).unwrap().contains("Unknown command"));
    }

    #[test]
    fn test_render_overview() {
        let text = render(&Grammar::new(), None).unwrap();
        assert!(text.starts_with("Commands:"));
        assert!(text.contains("discover"));
        assert!(text.contains("quit"));
    }
}
