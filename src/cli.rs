use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::archive::{pack::pack, unpack::unpack};
use crate::config;
use crate::constants::{ARCHIVE_EXTENSION, DEFAULT_PROJECT_FILE, TEMPLATE_PREFIX};
use crate::core::{
    domain::{LineSeparator, ProjectDescriptor},
    pipeline::testing::test_project,
    report::Report,
};
use crate::native::executor::NativeExecutor;
use crate::project::{
    manifest,
    store::{self, NewProject},
};

#[derive(Parser)]
#[command(name = "project-packer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Handles the boring stuff of CS class", long_about = None)]
pub struct Cli {
    /// The toml file for the project
    #[arg(short, long, global = true, env = "PROJECT_PACKER_FILE", default_value = DEFAULT_PROJECT_FILE)]
    pub file: PathBuf,

    /// Directory holding the project registry and templates
    #[arg(long, global = true, env = "PROJECT_PACKER_HOME")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project in the current directory
    New {
        #[arg(long)]
        name: String,

        #[arg(long, env = "USER", default_value = "")]
        author: String,

        #[arg(long, default_value = "main.py")]
        main_file: String,

        #[arg(long, default_value_t = 3)]
        required_passes: u32,

        /// Time out after this many seconds
        #[arg(long, default_value_t = 2)]
        timeout: u64,

        /// Count a clean execution as one pass
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        count_execution_as_pass: bool,
    },

    /// Run the test script and compare its output
    Test,

    /// Pack the tracked files into an archive, after the tests pass
    Pack {
        /// Archive to write (default: <ProjectName>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        skip_tests: bool,
    },

    /// Unpack a packed project into a directory named after the archive
    Unpack { archive: PathBuf },

    /// Add an existing file to the package
    Add { file: String },

    /// Create an empty file and add it to the package (use template:<name> to copy a template)
    Create { file: String },

    /// Remove a file from the package
    Remove {
        file: String,

        /// Also delete the file from disk
        #[arg(short = 'R', long)]
        delete: bool,
    },

    /// Set how many days until the project is due (-1 for no due date, 0 for end of the day)
    Due {
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },

    /// Show the project, the files in the package and the known projects and templates
    List,

    /// Manage code templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// Copy a file into the template store under a name
    Add {
        name: String,
        language: String,
        path: PathBuf,
    },

    /// Show the registered templates
    List,
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let working_dir = std::env::current_dir().context("cannot determine working directory")?;
    let config_dir = cli.config_dir.or_else(config::default_dir);

    match cli.command {
        Commands::New {
            name,
            author,
            main_file,
            required_passes,
            timeout,
            count_execution_as_pass,
        } => {
            let project = NewProject {
                name,
                author,
                main_file,
                required_passes,
                timeout_seconds: timeout,
                count_execution_as_pass,
            };
            let descriptor = create_project(&cli.file, &working_dir, project)?;
            register(config_dir.as_deref(), &descriptor, &working_dir.join(&cli.file));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Unpack { archive } => {
            if !archive.is_file() {
                bail!("the project archive {} does not exist", archive.display());
            }
            let destination = unpack(&archive, &working_dir)
                .with_context(|| format!("failed to unpack {}", archive.display()))?;
            println!("Unpacked into {}", destination.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Template { command } => {
            run_template(command, require_config_dir(config_dir.as_deref())?)?;
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let mut descriptor = store::load(&cli.file, &working_dir)
                .with_context(|| format!("cannot load project file {}", cli.file.display()))?;
            register(config_dir.as_deref(), &descriptor, &working_dir.join(&cli.file));
            let code =
                run_on_project(command, &mut descriptor, &working_dir, config_dir.as_deref()).await?;
            store::save(&cli.file, &descriptor)
                .with_context(|| format!("cannot save project file {}", cli.file.display()))?;
            Ok(code)
        }
    }
}

async fn run_on_project(
    command: Commands,
    descriptor: &mut ProjectDescriptor,
    working_dir: &Path,
    config_dir: Option<&Path>,
) -> Result<ExitCode> {
    match command {
        Commands::Test => Ok(verdict_exit_code(run_tests(descriptor).await?)),
        Commands::Pack { output, skip_tests } => {
            if !skip_tests && !run_tests(descriptor).await? {
                println!("Refusing to pack a project that fails its tests");
                return Ok(ExitCode::FAILURE);
            }

            let archive = output.unwrap_or_else(|| {
                PathBuf::from(format!("{}.{}", descriptor.project_name, ARCHIVE_EXTENSION))
            });
            pack(&archive, working_dir, &descriptor.project_files)
                .with_context(|| format!("failed to pack {}", archive.display()))?;
            println!("Packed {} files into {}", descriptor.project_files.len(), archive.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Add { file } => {
            println!("Adding {file} to project...");
            manifest::track(descriptor, &file)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Create { file } => {
            match file.strip_prefix(TEMPLATE_PREFIX) {
                Some(name) => {
                    let app_config = config::load(require_config_dir(config_dir)?)?;
                    let template = config::template(&app_config, name)?;
                    let created =
                        manifest::create_from_template(descriptor, working_dir, Path::new(&template.path))?;
                    println!("Created {created} from template {name}");
                }
                None => manifest::create_file(descriptor, working_dir, &file)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Remove { file, delete } => {
            println!("Removing {file}...");
            manifest::untrack(descriptor, working_dir, &file, delete)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Due { days } => {
            manifest::set_due_date(descriptor, days, chrono::Utc::now())?;
            println!("Project due: {}", descriptor.due_date);
            Ok(ExitCode::SUCCESS)
        }
        Commands::List => {
            print!("{}", manifest::listing(descriptor));
            if let Some(dir) = config_dir {
                let app_config = config::load(dir)?;
                println!("{}\nProjects:\n", "=".repeat(100));
                print!("{}", config::list_projects(&app_config));
                println!("{}\nTemplates:\n", "=".repeat(100));
                print!("{}", config::list_templates(&app_config));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::New { .. } | Commands::Unpack { .. } | Commands::Template { .. } => {
            bail!("this command does not operate on an existing project")
        }
    }
}

async fn run_tests(descriptor: &ProjectDescriptor) -> Result<bool> {
    print_header(descriptor);

    let mut report = Report::new();
    let result = test_project(
        descriptor,
        &NativeExecutor::new(),
        LineSeparator::native(),
        &mut report,
    )
    .await;

    for line in report.lines() {
        println!("{line}");
    }
    let passed = result.context("project descriptor is malformed")?;

    if passed {
        println!(
            "Project passes at least {} tests!\nIf there are more tests to pass try them! Otherwise submit this!",
            descriptor.required_passes
        );
    } else {
        println!(
            "Project failed too many tests! {} checks failed, see above to find out what went wrong",
            report.failures().count()
        );
    }
    Ok(passed)
}

fn print_header(descriptor: &ProjectDescriptor) {
    println!(
        "Testing project {} by {}",
        descriptor.project_name, descriptor.author
    );
    println!(
        "Constraints:\n\tRequired Passes = {}\n\tMust execute within {} seconds\n\tExpected outputs in order:\n\t\t{}\n",
        descriptor.required_passes,
        descriptor.timeout_seconds,
        descriptor.expected_outputs.join("\n\t\t")
    );
    println!("{}\n", "=".repeat(100));
}

fn verdict_exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_template(command: TemplateCommand, config_dir: &Path) -> Result<()> {
    let mut app_config = config::load(config_dir)?;
    match command {
        TemplateCommand::Add {
            name,
            language,
            path,
        } => {
            println!("Adding {name} to templates...");
            let template = config::add_template(&mut app_config, config_dir, &name, &language, &path)?;
            println!("Stored {} as {}", path.display(), template.path);
            config::save(config_dir, &app_config)?;
        }
        TemplateCommand::List => print!("{}", config::list_templates(&app_config)),
    }
    Ok(())
}

/// Adds the project to the registry. Failures are logged and ignored.
fn register(config_dir: Option<&Path>, descriptor: &ProjectDescriptor, descriptor_path: &Path) {
    let Some(dir) = config_dir else {
        tracing::warn!("No config directory, project {:?} is not registered", descriptor.project_name);
        return;
    };

    let registered = config::load(dir).and_then(|mut app_config| {
        if config::register_project(&mut app_config, descriptor, descriptor_path) {
            config::save(dir, &app_config)?;
        }
        Ok(())
    });
    if let Err(e) = registered {
        tracing::warn!("Could not register project {:?}: {}", descriptor.project_name, e);
    }
}

fn require_config_dir(config_dir: Option<&Path>) -> Result<&Path> {
    config_dir.context("no config directory found, set PROJECT_PACKER_HOME or --config-dir")
}

fn create_project(file: &Path, working_dir: &Path, project: NewProject) -> Result<ProjectDescriptor> {
    let path = working_dir.join(file);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let mut descriptor = store::new_descriptor(project);
    descriptor.project_path = working_dir.to_string_lossy().replace('\\', "/");

    println!("Adding main project file...");
    let main_file = descriptor.main_file.clone();
    manifest::create_file(&mut descriptor, working_dir, &main_file)?;

    println!("Adding test file...");
    let test_script = descriptor.test_script.clone();
    if test_script != main_file {
        manifest::create_file(&mut descriptor, working_dir, &test_script)?;
    }

    println!("Now creating {}...", path.display());
    store::save(&path, &descriptor)?;
    println!("Done project created...");
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_due_accepts_negative_days() {
        let cli = Cli::try_parse_from(["project-packer", "due", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Due { days: -1 }));
        assert_eq!(cli.file, PathBuf::from(DEFAULT_PROJECT_FILE));
    }

    #[test]
    fn test_create_project_writes_descriptor_and_files() {
        let dir = TempDir::new().unwrap();
        let project = NewProject {
            name: "lab2".to_string(),
            author: "A. Student".to_string(),
            main_file: "lab2.py".to_string(),
            required_passes: 1,
            timeout_seconds: 3,
            count_execution_as_pass: true,
        };

        create_project(Path::new(DEFAULT_PROJECT_FILE), dir.path(), project.clone()).unwrap();

        assert!(dir.path().join("lab2.py").is_file());
        assert!(dir.path().join("test.py").is_file());
        let descriptor = store::load(&dir.path().join(DEFAULT_PROJECT_FILE), dir.path()).unwrap();
        assert_eq!(descriptor.project_files, vec!["project.toml", "lab2.py", "test.py"]);

        // A second run must not clobber the existing project.
        assert!(create_project(Path::new(DEFAULT_PROJECT_FILE), dir.path(), project).is_err());
    }

    #[test]
    fn test_template_add_arguments() {
        let cli = Cli::try_parse_from([
            "project-packer",
            "--config-dir",
            "/tmp/packer",
            "template",
            "add",
            "py",
            "python",
            "skeleton.py",
        ])
        .unwrap();

        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/packer")));
        assert!(matches!(
            cli.command,
            Commands::Template {
                command: TemplateCommand::Add { ref name, ref language, ref path }
            } if name == "py" && language == "python" && path == Path::new("skeleton.py")
        ));
    }

    #[tokio::test]
    async fn test_create_from_registered_template() {
        let config_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = work.path().join("skeleton.py");
        std::fs::write(&source, "print('hello')\n").unwrap();

        run_template(
            TemplateCommand::Add {
                name: "py".to_string(),
                language: "python".to_string(),
                path: source,
            },
            config_dir.path(),
        )
        .unwrap();

        let project_dir = TempDir::new().unwrap();
        let mut descriptor = store::new_descriptor(NewProject {
            name: "lab4".to_string(),
            author: "A. Student".to_string(),
            main_file: "main.py".to_string(),
            required_passes: 1,
            timeout_seconds: 2,
            count_execution_as_pass: true,
        });
        run_on_project(
            Commands::Create {
                file: "template:py".to_string(),
            },
            &mut descriptor,
            project_dir.path(),
            Some(config_dir.path()),
        )
        .await
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(project_dir.path().join("skeleton.py")).unwrap(),
            "print('hello')\n"
        );
        assert!(descriptor.project_files.contains(&"skeleton.py".to_string()));

        let missing = run_on_project(
            Commands::Create {
                file: "template:rust".to_string(),
            },
            &mut descriptor,
            project_dir.path(),
            Some(config_dir.path()),
        )
        .await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_register_project_in_config_dir() {
        let config_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let project = NewProject {
            name: "lab5".to_string(),
            author: "A. Student".to_string(),
            main_file: "main.py".to_string(),
            required_passes: 1,
            timeout_seconds: 2,
            count_execution_as_pass: true,
        };
        let descriptor = create_project(Path::new(DEFAULT_PROJECT_FILE), work.path(), project).unwrap();
        let descriptor_path = work.path().join(DEFAULT_PROJECT_FILE);

        register(Some(config_dir.path()), &descriptor, &descriptor_path);
        register(Some(config_dir.path()), &descriptor, Path::new("/moved/project.toml"));

        let app_config = config::load(config_dir.path()).unwrap();
        assert_eq!(app_config.projects.len(), 1);
        assert_eq!(
            Path::new(&app_config.projects["lab5"].toml_path),
            descriptor_path
        );
    }
}
