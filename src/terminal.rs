use colored::*;
use gid_core::{DisplaySink, Role};

/// Prints the transcript to stdout, newest entry last.
pub struct TerminalSink;

impl DisplaySink for TerminalSink {
    fn show_city(&mut self, city: Option<&str>) {
        match city {
            Some(city) => println!("{} {}", "📍 City:".dimmed(), city.bold().cyan()),
            None => println!("{}", "📍 No city selected".dimmed()),
        }
    }

    fn append(&mut self, role: Role, html: &str) {
        match role {
            Role::User => println!("\n{} {}", "you ›".bold().green(), html),
            Role::Assistant => println!("\n{} {}", "guide ›".bold().magenta(), html),
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            println!("{}", "…".dimmed());
        }
    }

    fn notify(&mut self, text: &str) {
        println!("{}", text.yellow());
    }

    fn clear(&mut self) {
        // ANSI: clear screen, cursor home
        print!("\x1B[2J\x1B[H");
    }
}
