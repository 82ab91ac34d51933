use std::path::Path;
use std::process::ExitCode;

use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use log::{error, info};

use gate2spice_opt::{DEFAULT_MAX_ARITY, rewrite_module};
use gate2spice_spice::{
    OutputLevel, format_flattened, format_hierarchical, generate_netlist, validate,
};
use gate2spice_techmap::load_cell_library;

struct Options {
    input: String,
    output: String,
    top: Option<String>,
    library: Option<String>,
    technology: Option<String>,
    level: String,
    hierarchical: bool,
    no_rewrite: bool,
    max_arity: usize,
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&options.input)?;
    let design = gate2spice_yosys_json::import(&text)?;
    let module = design.top_module(options.top.as_deref())?;
    info!("top module: {}", module.name);

    let library = load_cell_library(
        options.library.as_deref().map(Path::new),
        Some(Path::new("cells.json")),
        options.technology.as_deref(),
    )?;

    let mut module = module.clone();
    if !options.no_rewrite {
        rewrite_module(&mut module, &library, options.max_arity);
    }

    let netlist = generate_netlist(&module, &library, &options.input)?;
    let rendered = if options.hierarchical {
        format_hierarchical(&netlist, &module, &library)
    } else {
        let level = match options.level.as_str() {
            "logic" => OutputLevel::Logic,
            "transistor" => OutputLevel::Transistor,
            other => return Err(format!("unknown output level {other:?}").into()),
        };
        format_flattened(&netlist, &library, level)?
    };
    if !validate(&rendered) {
        return Err("generated netlist failed validation".into());
    }
    std::fs::write(&options.output, rendered)?;
    info!("wrote {}", options.output);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut options = Options {
        input: String::new(),
        output: String::new(),
        top: None,
        library: None,
        technology: None,
        level: "logic".to_owned(),
        hierarchical: false,
        no_rewrite: false,
        max_arity: DEFAULT_MAX_ARITY,
    };
    {
        let mut parser = ArgumentParser::new();
        parser.set_description("Convert a gate-level JSON netlist to a SPICE netlist.");
        parser
            .refer(&mut options.input)
            .add_argument("INPUT", Store, "gate-level netlist in JSON format")
            .required();
        parser
            .refer(&mut options.output)
            .add_argument("OUTPUT", Store, "SPICE netlist to write")
            .required();
        parser
            .refer(&mut options.top)
            .add_option(&["-t", "--top"], StoreOption, "name of the top module");
        parser
            .refer(&mut options.library)
            .add_option(&["-l", "--library"], StoreOption, "cell library metadata file");
        parser
            .refer(&mut options.technology)
            .add_option(&["--tech"], StoreOption, "technology name override");
        parser
            .refer(&mut options.level)
            .add_option(&["--level"], Store, "output level: logic or transistor");
        parser
            .refer(&mut options.hierarchical)
            .add_option(&["--hierarchical"], StoreTrue, "wrap the output in a .SUBCKT");
        parser
            .refer(&mut options.no_rewrite)
            .add_option(&["--no-rewrite"], StoreTrue, "skip adder detection and chain collapsing");
        parser
            .refer(&mut options.max_arity)
            .add_option(&["--max-arity"], Store, "widest gate chain collapsing may produce");
        parser.parse_args_or_exit();
    }

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{}", error);
            ExitCode::FAILURE
        }
    }
}
