use automataviz::dfa::{construct_dfa, Conversion, ConversionStep};
use automataviz::document::{load_automaton, save_json};
use automataviz::editor::Editor;
use automataviz::fa::show_fa;
use automataviz::replay::{StepNavigator, TransitionTable};
use automataviz::visualizer;
use clap::{Arg, ArgMatches, Command};
use color_eyre::eyre::{bail, Report, Result};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

fn file_arg() -> Arg {
    Arg::new("file")
        .help("The automaton document, as exported by the editor")
        .value_name("AUTOMATON JSON")
        .value_parser(clap::value_parser!(PathBuf))
        .required(true)
}

fn cli() -> Command {
    Command::new("automataviz")
        .version("0.1.0")
        .about("Convert NFAs into DFAs with the subset construction and replay every step of it")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .help("Only log events at this level or above")
                .long_help("Only log events at this level or above. One of TRACE, DEBUG, INFO, WARN, ERROR")
                .value_name("LEVEL")
                .default_value("warn")
                .global(true)
                .value_parser(clap::value_parser!(String)),
        )
        .subcommand(
            Command::new("convert")
                .about("Run the subset construction and print the steps it took")
                .arg(file_arg())
                .arg(
                    Arg::new("step")
                        .short('s')
                        .long("step")
                        .help("Only print this step, counting from 1")
                        .value_name("STEP")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("table")
                        .short('t')
                        .long("table")
                        .help("Print the transition table after every step")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("trace-out")
                        .long("trace-out")
                        .help("Save the steps as JSON")
                        .value_name("TRACE FILE")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("dfa-out")
                        .long("dfa-out")
                        .help("Save the resulting DFA as an automaton document")
                        .value_name("DFA FILE")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("save-dfa")
                        .short('d')
                        .long("save-dfa")
                        .help("Save the DFA as <NAME>.dot and render <NAME>.jpg with Graphviz")
                        .value_name("NAME")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    Arg::new("visualize")
                        .short('v')
                        .long("visualize")
                        .help("Step through the conversion inside an interactive window")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check the automaton for missing initial or accepting states")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a word through the automaton and through its converted DFA")
                .arg(file_arg())
                .arg(
                    Arg::new("word")
                        .help("The symbols of the word, one per argument")
                        .value_name("SYMBOL")
                        .num_args(0..)
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("visualize")
                .about("Show the automaton inside an interactive window")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("dot")
                .about("Save the automaton in the dot language")
                .arg(file_arg())
                .arg(
                    Arg::new("name")
                        .help("Written to <NAME>.dot")
                        .value_name("NAME")
                        .required(true)
                        .value_parser(clap::value_parser!(String)),
                ),
        )
}

fn parse_level(args: &ArgMatches) -> Result<Level> {
    let level = args
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");

    Level::from_str(level)
        .map_err(|_| Report::msg(format!("Invalid log level: {level}")))
}

fn init_logging(args: &ArgMatches) -> Result<()> {
    let level = parse_level(args)?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn input_file(args: &ArgMatches) -> Result<&PathBuf> {
    match args.get_one::<PathBuf>("file") {
        Some(file_path) => Ok(file_path),
        None => bail!("Error: Automaton file not provided!"),
    }
}

fn print_step(step: &ConversionStep, conversion: &Conversion, with_table: bool) {
    println!("Step {}: {}", step.step, step.description);
    if let Some(new_state) = &step.new_state {
        println!("  new state: {}", new_state);
    }
    if with_table {
        print!("{}", TransitionTable::for_step(step, &conversion.alphabet));
        println!();
    }
}

fn convert(args: &ArgMatches) -> Result<()> {
    let nfa = load_automaton(input_file(args)?)?;
    let conversion = construct_dfa(&nfa)?;

    let with_table = args.get_flag("table");

    match args.get_one::<u64>("step") {
        Some(&step) => {
            let mut navigator = StepNavigator::new(conversion.steps.clone());
            let step = navigator.jump_to(step as usize - 1)?;
            print_step(step, &conversion, with_table);
        }
        None => {
            for step in &conversion.steps {
                print_step(step, &conversion, with_table);
            }
        }
    }

    if let Some(trace_path) = args.get_one::<PathBuf>("trace-out") {
        save_json(&conversion.steps, trace_path)?;
    }

    if let Some(dfa_path) = args.get_one::<PathBuf>("dfa-out") {
        save_json(&conversion.to_automaton(), dfa_path)?;
    }

    if let Some(name) = args.get_one::<String>("save-dfa") {
        show_fa(&conversion.to_automaton(), name, true)?;
    }

    if args.get_flag("visualize") {
        visualizer::visualize_steps(conversion)?;
    }

    Ok(())
}

fn validate(args: &ArgMatches) -> Result<()> {
    let text = fs::read_to_string(input_file(args)?)?;

    let mut editor = Editor::new();
    editor.import_json(&text)?;

    let report = editor.validate();
    println!("{}", report);

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn simulate(args: &ArgMatches) -> Result<()> {
    let nfa = load_automaton(input_file(args)?)?;
    let conversion = construct_dfa(&nfa)?;

    let word: Vec<String> = args
        .get_many::<String>("word")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let verdict = |accepted: bool| if accepted { "accepted" } else { "rejected" };

    println!("NFA: {}", verdict(nfa.accepts(&word)));
    println!("DFA: {}", verdict(conversion.accepts(&word)));
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = cli().get_matches();

    init_logging(&args)?;

    match args.subcommand() {
        Some(("convert", sub_args)) => convert(sub_args),
        Some(("validate", sub_args)) => validate(sub_args),
        Some(("simulate", sub_args)) => simulate(sub_args),
        Some(("visualize", sub_args)) => {
            let automaton = load_automaton(input_file(sub_args)?)?;
            visualizer::visualize(&automaton)
        }
        Some(("dot", sub_args)) => {
            let automaton = load_automaton(input_file(sub_args)?)?;
            let name = match sub_args.get_one::<String>("name") {
                Some(name) => name,
                None => bail!("Error: Output name not provided!"),
            };
            show_fa(&automaton, name, false)
        }
        _ => unreachable!("a subcommand is required"),
    }
}
