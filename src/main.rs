//! `main.rs` contains the command-line interface for refnotes. It collects the
//! values and options, sets up the logger, assembles the configuration, and
//! passes the configuration to the main function.
#[macro_use]
extern crate slog;

use ansi_term::Color;
use clap::{crate_version, App, Arg};
use refnotes::config::{Output, RefsConfig};
use slog::{debug, Drain, Level};
use std::{fs::OpenOptions, process, sync::Mutex};

fn main() {
    // Get the command-line arguments and options
    let matches = App::new("refnotes")
        .version(crate_version!())
        .about("Renders footnote macros into a numbered list of references")
        .arg(
            Arg::with_name("input")
                .value_name("INPUT FILE")
                .help("The wiki markup file (or .json tree) to process")
                .index(1)
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .value_name("OUTPUT FILE")
                .help("The output file (blank outputs to terminal)")
                .index(2)
                .required(false),
        )
        .arg(
            Arg::with_name("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("The output format (defaults to the output file's extension, then html)")
                .possible_values(["html", "json", "yaml", "ron"]),
        )
        .arg(
            Arg::with_name("no_transform")
                .short('N')
                .long("no_transform")
                .takes_value(false)
                .help("Output the parsed document without running its macros"),
        )
        .arg(
            Arg::with_name("force_overwrite")
                .short('W')
                .long("force_overwrite")
                .takes_value(false)
                .help("Required to overwrite the input file with the output"),
        )
        .arg(
            Arg::with_name("debug")
                .short('d')
                .long("debug")
                .takes_value(false)
                .help("Outputs debug log to refnotes-log.json")
                .hidden_short_help(true)
                .hidden_long_help(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short('v')
                .long("verbose")
                .value_name("NUMBER")
                .help("Verbosity level between 0 and 5")
                .hidden_short_help(true)
                .hidden_long_help(true)
                .default_value("1"),
        )
        .get_matches();

    // Setup the logger.
    //
    // If the debug flag is set, the log is also output to a file
    // `refnotes-log.json`.
    let debug = matches.is_present("debug");
    let min_log_level = match matches.value_of("verbose").unwrap_or("1") {
        "0" => Level::Critical,
        "1" => Level::Error,
        "2" => Level::Warning,
        "3" => Level::Info,
        "4" => Level::Debug,
        "5" => Level::Trace,
        _ => Level::Info,
    };

    let term_decorator = slog_term::TermDecorator::new().build();
    let term_drain = slog_term::CompactFormat::new(term_decorator).build().fuse();
    let term_drain = slog_async::Async::new(term_drain).build().fuse();
    let term_drain = term_drain.filter_level(min_log_level).fuse();

    let _guard: slog_scope::GlobalLoggerGuard = if debug {
        // Setup the file AND terminal loggers
        let log_file = match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open("./refnotes-log.json")
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("{} Cannot open log file: {}", Color::Red.paint("ERRO"), e);
                process::exit(1);
            }
        };
        let file_drain = slog_json::Json::new(log_file)
            .set_pretty(true)
            .add_default_keys()
            .build()
            .fuse();
        let file_drain = file_drain.filter_level(Level::Trace).fuse();
        let dual_logger = slog::Logger::root(
            Mutex::new(slog::Duplicate(term_drain, file_drain)).fuse(),
            o!("version" => crate_version!()),
        );
        slog_scope::set_global_logger(dual_logger)
    } else {
        // Setup just the terminal logger
        let term_logger = slog::Logger::root(term_drain, o!("version" => crate_version!()));
        slog_scope::set_global_logger(term_logger)
    };

    debug!(slog_scope::logger(), "Logger setup");

    // Files
    let input = matches.value_of("input").unwrap_or_default();
    let output = matches.value_of("output");

    // Deal with command-line errors.
    //
    // If the input and output strings are identical and force_overwrite has not
    // been used, return an error and exit.
    if output == Some(input) && !matches.is_present("force_overwrite") {
        eprintln!("{} The input file ({}) and output file ({}) are the same,\n     but the force overwrite option was not set.\n     If you want to overwrite the input file, use -W/--force_overwrite.", Color::Red.paint("ERRO"), Color::Blue.paint(input), Color::Blue.paint(output.unwrap_or_default()));
        process::exit(1);
    }

    // Determine the output format: the flag wins, then the file extension
    let format = match (matches.value_of("format"), output) {
        (Some(f), _) => Output::from_name(f).unwrap_or(Output::Html),
        (None, Some(o)) => match Output::from_path(o) {
            Some(f) => f,
            None => {
                eprintln!(
                    "{} Cannot tell the output format from {}; use -f/--format",
                    Color::Red.paint("ERRO"),
                    Color::Blue.paint(o)
                );
                process::exit(1);
            }
        },
        (None, None) => Output::Html,
    };

    // Create the configuration
    let config = RefsConfig::new(input, output, format, !matches.is_present("no_transform"));

    // Run the program.
    if let Err(e) = refnotes::refnotes(config) {
        error!(slog_scope::logger(), "{}", e);
        eprintln!("{} {}", Color::Red.paint("ERRO"), e);
        process::exit(1);
    }
}
