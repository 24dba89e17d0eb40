use crate::component::Component;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Staging and launch tooling for .NET Core applications
#[derive(Parser, Debug)]
#[command(
    name = "dotstage",
    about = "Staging and launch tooling for .NET Core applications",
    version,
    author,
    long_about = "dotstage inspects a pushed .NET Core application, decides how it should be \
                  deployed (built from source, framework-dependent, or self-contained), picks \
                  the SDK and runtime versions to install from a dependency manifest, and \
                  supervises the resulting process at runtime."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect how an application should be deployed",
        long_about = "Inspects the application directory and reports the deployment mode: \
                      source build, framework-dependent, or self-contained.\n\n\
                      Examples:\n  \
                      dotstage detect\n  \
                      dotstage detect /home/vcap/app\n  \
                      dotstage detect --format json"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Compute the full staging plan for an application",
        long_about = "Detects the deployment mode, resolves every required component version \
                      against the dependency manifest, and prints the resulting install and \
                      launch plan.\n\n\
                      Examples:\n  \
                      dotstage plan\n  \
                      dotstage plan /home/vcap/app --manifest manifest.yml\n  \
                      dotstage plan --stack cflinuxfs3 --format json -o plan.json"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Resolve a single version constraint against the manifest",
        long_about = "Resolves one component constraint against the dependency manifest \
                      without inspecting any application.\n\n\
                      Examples:\n  \
                      dotstage resolve dotnet-sdk 2.1.x\n  \
                      dotstage resolve dotnet-runtime '<2.1.9'\n  \
                      dotstage resolve dotnet-aspnetcore"
    )]
    Resolve(ResolveArgs),

    #[command(
        about = "Launch a staged application and supervise it",
        long_about = "Derives the launch command for a staged application, starts it, relays \
                      termination signals, and waits for it to exit.\n\n\
                      Examples:\n  \
                      dotstage launch\n  \
                      dotstage launch /home/vcap/app --grace-seconds 30"
    )]
    Launch(LaunchArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the application (defaults to current directory)"
    )]
    pub app_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the application (defaults to current directory)"
    )]
    pub app_dir: Option<PathBuf>,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        help = "Dependency manifest to resolve versions against (defaults to DOTSTAGE_MANIFEST)"
    )]
    pub manifest: Option<PathBuf>,

    #[arg(
        long,
        value_name = "STACK",
        help = "Only consider manifest entries built for this stack (defaults to CF_STACK)"
    )]
    pub stack: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(
        value_name = "COMPONENT",
        value_parser = parse_component,
        help = "Component to resolve (dotnet-sdk, dotnet-runtime, dotnet-aspnetcore, libgdiplus)"
    )]
    pub component: Component,

    #[arg(
        value_name = "CONSTRAINT",
        help = "Version constraint, e.g. 2.1.505, 2.1.x, 2.1.* or <2.1.9 (omit for latest)"
    )]
    pub constraint: Option<String>,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        help = "Dependency manifest to resolve versions against (defaults to DOTSTAGE_MANIFEST)"
    )]
    pub manifest: Option<PathBuf>,

    #[arg(
        long,
        value_name = "STACK",
        help = "Only consider manifest entries built for this stack (defaults to CF_STACK)"
    )]
    pub stack: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct LaunchArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the staged application (defaults to current directory)"
    )]
    pub app_dir: Option<PathBuf>,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        help = "Dependency manifest used during staging (defaults to DOTSTAGE_MANIFEST)"
    )]
    pub manifest: Option<PathBuf>,

    #[arg(
        long,
        value_name = "STACK",
        help = "Only consider manifest entries built for this stack (defaults to CF_STACK)"
    )]
    pub stack: Option<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Grace period before a signalled app is killed (defaults to DOTSTAGE_GRACE_SECONDS)"
    )]
    pub grace_seconds: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_component(s: &str) -> Result<Component, String> {
    Component::from_name(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "Invalid component: {}. Valid options: dotnet-sdk, dotnet-runtime, dotnet-aspnetcore, libgdiplus",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        // Verify that CLI structure is valid
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_plan_args() {
        let args = CliArgs::parse_from(["dotstage", "plan"]);
        match args.command {
            Commands::Plan(plan_args) => {
                assert_eq!(plan_args.format, OutputFormatArg::Human);
                assert!(plan_args.app_dir.is_none());
                assert!(plan_args.manifest.is_none());
                assert!(plan_args.stack.is_none());
                assert!(plan_args.output.is_none());
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_plan_with_options() {
        let args = CliArgs::parse_from([
            "dotstage",
            "plan",
            "/tmp/app",
            "--manifest",
            "manifest.yml",
            "--stack",
            "cflinuxfs3",
            "--format",
            "json",
            "-o",
            "plan.json",
        ]);

        match args.command {
            Commands::Plan(plan_args) => {
                assert_eq!(plan_args.app_dir, Some(PathBuf::from("/tmp/app")));
                assert_eq!(plan_args.manifest, Some(PathBuf::from("manifest.yml")));
                assert_eq!(plan_args.stack.as_deref(), Some("cflinuxfs3"));
                assert_eq!(plan_args.format, OutputFormatArg::Json);
                assert_eq!(plan_args.output, Some(PathBuf::from("plan.json")));
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_detect_with_path() {
        let args = CliArgs::parse_from(["dotstage", "detect", "/tmp/app"]);
        match args.command {
            Commands::Detect(detect_args) => {
                assert_eq!(detect_args.app_dir, Some(PathBuf::from("/tmp/app")));
                assert_eq!(detect_args.format, OutputFormatArg::Human);
            }
            _ => panic!("Expected Detect command"),
        }
    }

    #[test]
    fn test_resolve_command() {
        let args = CliArgs::parse_from(["dotstage", "resolve", "dotnet-sdk", "2.1.x"]);
        match args.command {
            Commands::Resolve(resolve_args) => {
                assert_eq!(resolve_args.component, Component::Sdk);
                assert_eq!(resolve_args.constraint.as_deref(), Some("2.1.x"));
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_resolve_without_constraint() {
        let args = CliArgs::parse_from(["dotstage", "resolve", "dotnet-runtime"]);
        match args.command {
            Commands::Resolve(resolve_args) => {
                assert_eq!(resolve_args.component, Component::Runtime);
                assert!(resolve_args.constraint.is_none());
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_launch_with_grace() {
        let args = CliArgs::parse_from(["dotstage", "launch", "--grace-seconds", "30"]);
        match args.command {
            Commands::Launch(launch_args) => {
                assert_eq!(launch_args.grace_seconds, Some(30));
            }
            _ => panic!("Expected Launch command"),
        }
    }

    #[test]
    fn test_global_verbose_flag() {
        let args = CliArgs::parse_from(["dotstage", "-v", "plan"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_global_quiet_flag() {
        let args = CliArgs::parse_from(["dotstage", "-q", "plan"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["dotstage", "--log-level", "debug", "plan"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_component_parsing() {
        assert!(parse_component("dotnet-sdk").is_ok());
        assert!(parse_component("dotnet-runtime").is_ok());
        assert!(parse_component("dotnet-aspnetcore").is_ok());
        assert!(parse_component("libgdiplus").is_ok());
        assert!(parse_component("invalid").is_err());
    }
}
