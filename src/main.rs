use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use quire::build::build_site;
use quire::config::Config;
use quire::manifest::Manifest;
use quire::markdown;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let matches = App::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from a directory of markdown files")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site described by the nearest quire.yaml")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .default_value(".")
                        .help("The directory to start searching for quire.yaml from"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .default_value("_site")
                        .help("The directory to write the site into"),
                ),
        )
        .subcommand(
            SubCommand::with_name("manifest")
                .about("Lists the markdown files in a blog directory as JSON")
                .arg(
                    Arg::with_name("blog_directory")
                        .required(true)
                        .help("The blog directory to scan"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("Where to write the manifest; stdout if omitted"),
                ),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Converts one markdown file to HTML on stdout")
                .arg(
                    Arg::with_name("file")
                        .help("The markdown file to convert; stdin if omitted"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(m)) => build(m),
        ("manifest", Some(m)) => manifest(m),
        ("render", Some(m)) => render(m),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build(matches: &ArgMatches) -> Result<()> {
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let output = Path::new(matches.value_of("output").unwrap_or("_site"));
    let project = project
        .canonicalize()
        .with_context(|| format!("Resolving project directory `{}`", project.display()))?;
    let config = Config::from_directory(&project, output)?;
    build_site(&config)?;
    Ok(())
}

fn manifest(matches: &ArgMatches) -> Result<()> {
    let blog_directory = Path::new(matches.value_of("blog_directory").unwrap_or("blog"));
    let manifest = Manifest::generate(blog_directory)?;
    match matches.value_of("output") {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Creating manifest file `{}`", path))?;
            manifest.write_to(file)?;
            info!(path, "wrote manifest");
        }
        None => manifest.write_to(io::stdout().lock())?,
    }
    Ok(())
}

fn render(matches: &ArgMatches) -> Result<()> {
    let mut input = String::new();
    match matches.value_of("file") {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Opening markdown file `{}`", path))?
                .read_to_string(&mut input)?;
        }
        None => {
            io::stdin().read_to_string(&mut input)?;
        }
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", markdown::convert(&input))?;
    Ok(())
}
