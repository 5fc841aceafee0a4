use std::ffi::OsString;
use std::time::Duration;

use clap::{App, Arg, ArgMatches};

pub const DEFAULT_BRIGHTNESS: u8 = 20;
pub const DEFAULT_INTERFACE: &str = "eth0";
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const MIN_DELAY_MS: u64 = 10;

/// Short flags that take a value; whatever follows them in a cluster is that value.
const VALUE_FLAGS: [char; 3] = ['b', 'n', 'd'];
const VALUE_OPTIONS: [&str; 3] = ["--brightness", "--interface", "--delay"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Full-scale LED brightness, 1-100.
    pub brightness: u8,
    pub interface: String,
    pub delay: Duration,
    /// Stay in the foreground instead of forking.
    pub console: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            brightness: DEFAULT_BRIGHTNESS,
            interface: DEFAULT_INTERFACE.to_owned(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            console: false,
        }
    }
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("glowmon")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Shows temperature, cpu load and network traffic on a PiGlow")
        .arg(Arg::with_name("brightness")
             .short("b")
             .long("brightness")
             .value_name("1-100")
             .help("Sets the maximum LED brightness")
             .takes_value(true)
             .allow_hyphen_values(true)
             .default_value("20"))
        .arg(Arg::with_name("interface")
             .short("n")
             .long("interface")
             .value_name("IFACE")
             .help("Network interface to watch")
             .takes_value(true)
             .default_value(DEFAULT_INTERFACE))
        .arg(Arg::with_name("delay")
             .short("d")
             .long("delay")
             .value_name("MS")
             .help("Milliseconds between updates (at least 10)")
             .takes_value(true)
             .default_value("1000"))
        .arg(Arg::with_name("console")
             .short("c")
             .long("console")
             .help("Runs at the console instead of forking a background process"))
}

/// getopt-style `?` is another way to ask for help, alone (`-?`) or inside a
/// cluster of short flags (`-c?`). Option values are left alone.
fn help_alias<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut value_next = false;
    let mut operands = false;
    for (idx, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if idx == 0 || operands || value_next {
            value_next = false;
            out.push(arg);
            continue;
        }
        let text = match arg.to_str() {
            Some(text) => text,
            None => {
                out.push(arg);
                continue;
            }
        };
        if text == "--" {
            operands = true;
        } else if text.starts_with("--") {
            value_next = VALUE_OPTIONS.contains(&text);
        } else if let Some(cluster) = text.strip_prefix('-') {
            let mut rewritten = String::from("-");
            let mut chars = cluster.chars();
            while let Some(c) = chars.next() {
                if VALUE_FLAGS.contains(&c) {
                    rewritten.push(c);
                    let value = chars.as_str();
                    value_next = value.is_empty();
                    rewritten.push_str(value);
                    break;
                }
                rewritten.push(if c == '?' { 'h' } else { c });
            }
            out.push(OsString::from(rewritten));
            continue;
        }
        out.push(arg);
    }
    out
}

impl Options {
    /// Parses the command line, exiting on `-h`, `-?` or bad usage.
    pub fn from_args() -> Options {
        Options::from_iter_safe(::std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn from_iter_safe<I, T>(args: I) -> Result<Options, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = app().get_matches_from_safe(help_alias(args))?;
        Options::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Options, clap::Error> {
        let brightness = value_t!(matches, "brightness", i64)?;
        let delay = value_t!(matches, "delay", u64)?;
        Ok(Options {
            brightness: brightness.max(1).min(100) as u8,
            interface: matches.value_of("interface").unwrap_or(DEFAULT_INTERFACE).to_owned(),
            delay: Duration::from_millis(delay.max(MIN_DELAY_MS)),
            console: matches.is_present("console"),
        })
    }
}
