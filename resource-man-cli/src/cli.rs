// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{config::load_registrations, logging},
    anyhow::{anyhow, Context, Result},
    clap::{value_parser, Arg, ArgAction, ArgMatches, Command},
    log::{info, warn},
    resource_man::{
        compiler::ResourceCompiler,
        packaging::{add_data_args, find_datas, registered_datas, DataFile},
        FilesystemResources, QrcDocument,
    },
    serde::Serialize,
    std::path::{Path, PathBuf},
};

const ABOUT: &str = "\
# About

`rsc-man` rebuilds a resource registry from a registration file and emits
what external tools need from it: Qt resource collection (`.qrc`) files,
compiled resource blobs, and data file arguments for freezing tools.

# Registration Files

A registration file is TOML. Top level registrations belong to the primary
manager. Each `[[manager]]` table defines an additional manager linked to
the primary one.

    search_paths = [\"src\"]    # package roots, relative to this file
    prefix = \"\"               # qrc prefix of the primary manager

    [[resource]]
    package = \"acme.icons\"
    name = \"edit-cut.png\"
    alias = \"edit-cut\"         # or derive_alias = file-stem | file-name | package-path

    [[directory]]
    package = \"acme.themes\"
    extensions = [\".svg\"]

    [[manager]]
    prefix = \"rman2\"

    [[manager.resource]]
    package = \"acme\"
    name = \"rsc2.txt\"

Package roots listed in the RESOURCE_MAN_PATH environment variable are
searched after the configured ones.
";

const MANIFEST_ABOUT: &str = "\
Write a Qt resource collection file for a registration file.

Each manager becomes a `<qresource>` block with its prefix. Entries are
sorted by alias so the output only changes when registrations change.

File paths are written relative to the directory of the output file when
possible. Without --output the document is printed and paths are relative
to the current directory.
";

const COMPILE_ABOUT: &str = "\
Compile a Qt resource collection file.

Without --compiler the first of rcc, pyside6-rcc, pyside2-rcc, and pyrcc5
found on PATH is used. If the compiler fails, its output is reported
verbatim.
";

const DATAS_ABOUT: &str = "\
Print data files a freezing tool must bundle.

Every registered resource that exists on the filesystem is printed along
with the directory it must be copied to inside the bundle.

Formats:

args
   `--add-data SOURCE<sep>DEST` lines, shell quoted.
lines
   `SOURCE<sep>DEST` lines.
json
   A JSON array of objects with `source` and `destination` keys.
";

const FORMATS: [&str; 3] = ["args", "lines", "json"];

#[derive(Serialize)]
struct DataFileRecord<'a> {
    source: &'a Path,
    destination: &'a Path,
}

fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_parser(FORMATS)
        .default_value("args")
        .help("Output format")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .required(true)
        .value_name("CONFIG")
        .value_parser(value_parser!(PathBuf))
        .help("Path to registration file")
}

fn required_path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: {}", name))
}

fn print_datas(datas: &[DataFile], format: &str) -> Result<()> {
    match format {
        "args" => {
            for pair in add_data_args(datas).chunks(2) {
                let quoted = pair
                    .iter()
                    .map(|a| {
                        shlex::try_quote(a)
                            .map(|q| q.to_string())
                            .map_err(|e| anyhow!("unable to quote {}: {}", a, e))
                    })
                    .collect::<Result<Vec<_>>>()?;

                println!("{}", quoted.join(" "));
            }
        }
        "lines" => {
            for data in datas {
                println!("{}", data.to_add_data_value());
            }
        }
        "json" => {
            let records = datas
                .iter()
                .map(|d| DataFileRecord {
                    source: &d.source,
                    destination: &d.destination,
                })
                .collect::<Vec<_>>();

            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => return Err(anyhow!("unknown format: {}", format)),
    }

    Ok(())
}

fn command_manifest(args: &ArgMatches) -> Result<()> {
    let config_path = required_path(args, "config")?;
    let manager = load_registrations(&config_path)?;

    match args.get_one::<PathBuf>("output") {
        Some(output) => {
            let relative_to = match output.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => std::env::current_dir()?,
            };

            let doc = QrcDocument::from_manager(&manager, &relative_to)?;
            doc.write_to_path(output)
                .with_context(|| format!("writing {}", output.display()))?;

            info!(
                "wrote {} resources to {}",
                doc.resources.iter().map(|r| r.files.len()).sum::<usize>(),
                output.display()
            );
        }
        None => {
            let doc = QrcDocument::from_manager(&manager, &std::env::current_dir()?)?;
            println!("{}", String::from_utf8_lossy(&doc.to_xml()?));
        }
    }

    Ok(())
}

fn command_compile(args: &ArgMatches) -> Result<()> {
    let qrc = required_path(args, "qrc")?;
    let output = required_path(args, "output")?;

    let compiler = match args.get_one::<PathBuf>("compiler") {
        Some(path) => ResourceCompiler::new(path),
        None => ResourceCompiler::find()?,
    };

    info!(
        "compiling {} with {}",
        qrc.display(),
        compiler.executable().display()
    );
    compiler.compile(&qrc, &output)?;
    info!("wrote {}", output.display());

    Ok(())
}

fn command_datas(args: &ArgMatches) -> Result<()> {
    let config_path = required_path(args, "config")?;
    let manager = load_registrations(&config_path)?;

    let datas = registered_datas(&manager);
    if datas.is_empty() {
        warn!("no registered resources exist on the filesystem");
    }

    print_datas(&datas, args.get_one::<String>("format").map_or("args", |s| s.as_str()))
}

fn command_find_datas(args: &ArgMatches) -> Result<()> {
    let package = args
        .get_one::<String>("package")
        .ok_or_else(|| anyhow!("missing required argument: package"))?;

    let roots = args
        .get_many::<PathBuf>("path")
        .map(|v| v.cloned().collect::<Vec<_>>())
        .unwrap_or_else(|| vec![PathBuf::from(".")]);
    let reader = FilesystemResources::new(roots);

    let exclude = args
        .get_many::<String>("exclude")
        .map(|v| v.map(|s| s.as_str()).collect::<Vec<_>>());

    let datas = find_datas(&reader, package, exclude.as_deref())?;

    print_datas(&datas, args.get_one::<String>("format").map_or("args", |s| s.as_str()))
}

fn command_list(args: &ArgMatches) -> Result<()> {
    let config_path = required_path(args, "config")?;
    let manager = load_registrations(&config_path)?;

    for m in manager.manager_tree() {
        let raw = m.get_resources_raw();
        let qt_prefix = if m.prefix().is_empty() {
            ":/".to_string()
        } else {
            format!(":/{}/", m.prefix())
        };

        for entry in m.registered_entries() {
            let chain = raw.get(&entry.alias).map_or(0, |c| c.len());
            let exists = m
                .lookup(&entry.alias)
                .map_or(false, |r| r.exists());

            let mut line = format!(
                "{}{} -> {}/{}",
                qt_prefix,
                entry.alias,
                entry.package.replace('.', "/"),
                entry.name
            );
            if chain > 1 {
                line.push_str(&format!(" (shadows {})", chain - 1));
            }
            if !exists {
                line.push_str(" (missing)");
            }

            println!("{}", line);
        }
    }

    Ok(())
}

pub fn run_cli() -> Result<()> {
    let app = Command::new("rsc-man")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Emit manifests and packaging data for resource registries")
        .long_about(ABOUT)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase logging verbosity. Can be specified multiple times"),
        );

    let app = app.subcommand(
        Command::new("manifest")
            .about("Write a Qt resource collection file")
            .long_about(MANIFEST_ABOUT)
            .arg(config_arg())
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("PATH")
                    .value_parser(value_parser!(PathBuf))
                    .help("Path of .qrc file to write"),
            ),
    );

    let app = app.subcommand(
        Command::new("compile")
            .about("Compile a Qt resource collection file")
            .long_about(COMPILE_ABOUT)
            .arg(
                Arg::new("qrc")
                    .required(true)
                    .value_name("QRC")
                    .value_parser(value_parser!(PathBuf))
                    .help("Path of .qrc file to compile"),
            )
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .required(true)
                    .value_name("PATH")
                    .value_parser(value_parser!(PathBuf))
                    .help("Path of compiled file to write"),
            )
            .arg(
                Arg::new("compiler")
                    .long("compiler")
                    .value_name("EXE")
                    .value_parser(value_parser!(PathBuf))
                    .help("Resource compiler executable to run"),
            ),
    );

    let app = app.subcommand(
        Command::new("datas")
            .about("Print data files of registered resources")
            .long_about(DATAS_ABOUT)
            .arg(config_arg())
            .arg(format_arg()),
    );

    let app = app.subcommand(
        Command::new("find-datas")
            .about("Print every data file in a package tree")
            .arg(
                Arg::new("package")
                    .required(true)
                    .value_name("PACKAGE")
                    .help("Dotted name of package to scan"),
            )
            .arg(
                Arg::new("path")
                    .long("path")
                    .value_name("ROOT")
                    .action(ArgAction::Append)
                    .value_parser(value_parser!(PathBuf))
                    .help("Directory to search for the package. Defaults to the current directory"),
            )
            .arg(
                Arg::new("exclude")
                    .long("exclude")
                    .value_name("SUFFIX")
                    .action(ArgAction::Append)
                    .help("File suffix to skip. Replaces the default of .py, .pyw, .pyc, and .pyd"),
            )
            .arg(format_arg()),
    );

    let app = app.subcommand(
        Command::new("list")
            .about("List registered aliases")
            .arg(config_arg()),
    );

    let matches = app.get_matches();

    let (command, args) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("invalid sub-command"))?;

    logging::init_logger(args.get_count("verbose"));

    match command {
        "manifest" => command_manifest(args),
        "compile" => command_compile(args),
        "datas" => command_datas(args),
        "find-datas" => command_find_datas(args),
        "list" => command_list(args),
        _ => Err(anyhow!("invalid sub-command")),
    }
}

