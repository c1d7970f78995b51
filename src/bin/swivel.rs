//! Line-oriented shell for adjusting the balance of the default output
//!
//! Set RUST_LOG=debug for verbose output.

use std::io::{self, BufRead, Write};

use swivel::{endpoint, Balance, DynBalancer, Notification};

const HELP: &str = "\
Commands:
  L/R          set the manual balance in percent, e.g. 40/60
  8d on|off    turn the auto-pan sweep on or off
  cap N        limit the sweep to N percent of a full swing
  status       show the endpoint and the last applied balance
  help         show this message
An empty line exits.";

#[derive(Debug, PartialEq)]
enum Command {
    Manual(Balance),
    AutoPan(Option<bool>),
    Cap(f32),
    Status,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Quit);
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("Too many arguments in `{line}`"));
        }
        match (head.to_ascii_lowercase().as_str(), arg) {
            ("quit" | "exit", None) => Ok(Command::Quit),
            ("help" | "?", None) => Ok(Command::Help),
            ("status", None) => Ok(Command::Status),
            ("8d", None) => Ok(Command::AutoPan(None)),
            ("8d", Some("on")) => Ok(Command::AutoPan(Some(true))),
            ("8d", Some("off")) => Ok(Command::AutoPan(Some(false))),
            ("cap", Some(n)) => n
                .parse::<f32>()
                .map(|n| Command::Cap(n / 100.0))
                .map_err(|e| format!("Invalid cap `{n}`: {e}")),
            (_, None) if head.contains('/') => head
                .parse()
                .map(Command::Manual)
                .map_err(|e| format!("{e}")),
            _ => Err(format!("Unknown command `{line}`, try `help`")),
        }
    }
}

fn print_notifications(balancer: &DynBalancer) {
    for notification in balancer.notifications().try_iter() {
        match notification {
            Notification::SinkFailed(e) => println!("  ! {e}"),
            Notification::SinkRecovered => println!("  ✓ Output endpoint available again"),
            Notification::EndpointChanged(name) => println!("  Interface: {name}"),
            Notification::AutoPan(_) => {}
        }
    }
}

/// Describe the endpoint and settings, looking the endpoint name up again
/// in case the default output changed
fn describe_status(balancer: &DynBalancer) -> String {
    balancer.endpoint_name();
    let snapshot = balancer.snapshot();
    format!(
        "  {}\n  Manual {}, 8D {}, cap {:.0}%",
        balancer.status(),
        snapshot.manual,
        if snapshot.auto_pan { "on" } else { "off" },
        snapshot.intensity_cap * 100.0
    )
}

fn run(balancer: &DynBalancer) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_notifications(balancer);
        print!("Input (L/R): ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("  ↳ {e}");
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Status => println!("{}", describe_status(balancer)),
            Command::Manual(balance) => {
                let previous = balancer.snapshot();
                match balancer.set_manual(balance.left, balance.right) {
                    Ok(stored) if previous.auto_pan => {
                        println!("  ↳ Stored {stored}, applied when 8D is turned off")
                    }
                    Ok(stored) => println!("  ↳ Applying balance: {} → {stored}", previous.manual),
                    Err(e) => println!("  ↳ Stored {balance}, but the output did not change: {e}"),
                }
            }
            Command::AutoPan(flag) => {
                let enabled = flag.unwrap_or(!balancer.snapshot().auto_pan);
                match balancer.set_auto_pan_enabled(enabled) {
                    Ok(()) if enabled => println!("  ↳ 8D on"),
                    Ok(()) => println!("  ↳ 8D off, restored {}", balancer.snapshot().manual),
                    Err(e) => println!("  ↳ 8D off, but the manual balance was not restored: {e}"),
                }
            }
            Command::Cap(cap) => {
                let stored = balancer.set_intensity_cap(cap);
                println!("  ↳ Intensity cap {:.0}%", stored * 100.0);
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let balancer = DynBalancer::new(endpoint::default_sink())?;
    println!("Interface: {}", balancer.endpoint_name());
    println!("Previous balance: {}", balancer.snapshot().manual);
    // The initial name notification was just printed
    let _ = balancer.notifications().try_iter().count();

    run(&balancer)?;
    println!("Exiting.");
    Ok(())
}
