use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use spectral_landcover::config::{Settings, CONFIG_FILE};
use spectral_landcover::pipeline::{self, RunOptions, RunSummary, SnowJob, VegetationJob, WaterJob};
use spectral_landcover::{logger, report};

const DEFAULT_RESAMPLING: &str = "NEAREST";

fn file_arg(id: &'static str, short: char, help: &'static str) -> Arg {
  Arg::new(id)
    .short(short)
    .long(id)
    .value_name("file")
    .required(true)
    .help(help)
}

// Output, worker and overview options shared by all classifications
fn output_args(command: Command) -> Command {
  command
    .arg(file_arg("output", 'o', "Specify the output file path (.kea, .img or .tif); must not exist"))
    .arg(
      Arg::new("jobs")
        .short('j')
        .long("jobs")
        .help("Specify the number of threads to use (if omitted, all available processors are used)"),
    )
    .arg(
      Arg::new("no_overviews")
        .long("no-overviews")
        .help("Do not build overviews for the output raster")
        .action(ArgAction::SetTrue),
    )
}

fn build_cli() -> Command {
  Command::new("Spectral Land Cover Classifier")
    .version(env!("CARGO_PKG_VERSION"))
    .subcommand_required(true)
    .arg_required_else_help(true)
    .subcommand(output_args(
      Command::new("snow")
        .about("Derive a snow mask from reflectance imagery and a DEM")
        .arg(file_arg("imagery", 'i', "Standardised reflectance imagery (4, 6, 7 or 10 bands, UInt16)"))
        .arg(file_arg("dem", 'd', "Elevation in metres on the imagery's pixel grid (any pixel type)"))
        .arg(file_arg("mask", 'm', "Valid data mask (Byte: 0 outside the image)")),
    ))
    .subcommand(output_args(
      Command::new("water")
        .about("Classify water, cloud and snow from reflectance imagery and masks")
        .arg(file_arg("imagery", 'i', "Standardised reflectance imagery (4, 6, 7 or 10 bands, UInt16)"))
        .arg(file_arg("cloud", 'c', "Cloud mask (Byte: 0 undefined, 5 cloud, any other value clear)"))
        .arg(file_arg("snow", 's', "Snow mask (Byte: 0 background, 1 snow, 2 bright water, 3 and above clear)")),
    ))
    .subcommand(output_args(
      Command::new("vegetation")
        .about("Refine a water classification into woody, herbaceous and bare ground")
        .arg(file_arg("imagery", 'i', "Standardised reflectance imagery (4, 6, 7 or 10 bands, UInt16)"))
        .arg(file_arg("water", 'w', "Water classification produced by the water command (Byte)"))
        .arg(file_arg("lcdb", 'l', "Land cover database raster on the same pixel grid (Byte)")),
    ))
}

fn path_of(matches: &ArgMatches, id: &str) -> Result<PathBuf, Box<dyn Error>> {
  matches
    .get_one::<String>(id)
    .map(PathBuf::from)
    .ok_or_else(|| format!("missing required argument '{}'", id).into())
}

// Worker count: command line, then app.config, then all processors
fn resolve_jobs(requested: Option<&String>, settings: &Settings) -> usize {
  let num_procs = num_cpus::get();
  match requested {
    Some(jobs_str) => match jobs_str.parse::<usize>() {
      Ok(max_jobs) if max_jobs > 0 => std::cmp::min(max_jobs, num_procs),
      Ok(_) => {
        println!(
          "{}: 'jobs' value must be greater than 0. Using the number of processors.\n",
          report::warning("Warning")
        );
        num_procs
      }
      Err(_) => {
        println!(
          "{}: 'jobs' value is not a valid number. Using the number of processors.\n",
          report::warning("Warning")
        );
        num_procs
      }
    },
    None => settings.jobs.map_or(num_procs, |jobs| std::cmp::min(jobs, num_procs)),
  }
}

fn run_options(matches: &ArgMatches, settings: &Settings) -> RunOptions {
  let overviews = if matches.get_flag("no_overviews") || settings.overviews == Some(false) {
    None
  } else {
    Some(settings.overview_resampling.clone().unwrap_or_else(|| DEFAULT_RESAMPLING.to_string()))
  };

  RunOptions {
    jobs: resolve_jobs(matches.get_one::<String>("jobs"), settings),
    verbose: settings.progress.unwrap_or(true),
    overviews,
  }
}

fn fail(message: String) -> ! {
  let output = format!("{}: {}", report::error("Error"), message);
  eprintln!("{}\n", report::bold(output));
  std::process::exit(1);
}

fn print_summary(summary: &RunSummary) {
  println!("{}", report::line());
  println!("Class counts ({}, {} x {}):", summary.sensor, summary.width, summary.height);
  for entry in &summary.legend {
    let count = summary.statistics.histogram[entry.code as usize];
    if count > 0 {
      let row = format!("└─{} {:>2} {:<40} {}", report::ARROW, entry.code, entry.name, count);
      println!("  {}", report::light(row));
    }
  }
}

fn main() -> Result<(), Box<dyn Error>> {
  let start_time = Instant::now();
  logger::init();

  let matches = build_cli().get_matches();

  println!(
    "{}",
    report::banner(
      "Spectral Land Cover Classifier",
      env!("CARGO_PKG_VERSION"),
      "Tool for classifying water, cloud, snow and vegetation from multispectral imagery."
    )
  );

  let settings = Settings::load(CONFIG_FILE).unwrap_or_else(|err| fail(err.to_string()));

  let outcome = match matches.subcommand() {
    Some(("snow", sub)) => {
      let job = SnowJob {
        imagery: path_of(sub, "imagery")?,
        dem: path_of(sub, "dem")?,
        mask: path_of(sub, "mask")?,
        output: path_of(sub, "output")?,
      };
      let options = run_options(sub, &settings);
      println!("Classifying snow using {} threads.\n", options.jobs);
      pipeline::run_snow(&job, &options)
    }
    Some(("water", sub)) => {
      let job = WaterJob {
        imagery: path_of(sub, "imagery")?,
        cloud: path_of(sub, "cloud")?,
        snow: path_of(sub, "snow")?,
        output: path_of(sub, "output")?,
      };
      let options = run_options(sub, &settings);
      println!("Classifying water using {} threads.\n", options.jobs);
      pipeline::run_water(&job, &options)
    }
    Some(("vegetation", sub)) => {
      let job = VegetationJob {
        imagery: path_of(sub, "imagery")?,
        water: path_of(sub, "water")?,
        lcdb: path_of(sub, "lcdb")?,
        output: path_of(sub, "output")?,
      };
      let options = run_options(sub, &settings);
      println!("Classifying vegetation using {} threads.\n", options.jobs);
      pipeline::run_vegetation(&job, &options)
    }
    _ => return Err("no classification selected".into()),
  };

  match outcome {
    Ok(summary) => {
      if summary.inconsistent > 0 {
        println!(
          "{}: {} pixels with inconsistent masks were left undefined.",
          report::warning("Warning"),
          summary.inconsistent
        );
      }
      print_summary(&summary);
    }
    Err(err) => fail(err.to_string()),
  }

  println!("{}", report::line());
  println!("{}", report::success("Calculations completed successfully."));
  println!("Total elapsed time: {:.2} seconds.", start_time.elapsed().as_secs_f64());
  println!();

  Ok(())
}
