use crate::server;
use clap::{Args, Parser, Subcommand};
use cliro::assistant::{build_prompt, Action};
use cliro::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Cliro API",
    about = "Run the Cliro waitlist and writing assistant service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the prompt an assistant action would send to the generator
    Prompt(PromptArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Keep waitlist rows in process memory instead of the remote table store
    #[arg(long)]
    pub(crate) in_memory: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PromptArgs {
    /// Action name, English or Spanish (summarize, traducir, xray, ...)
    #[arg(long, default_value = "summarize")]
    pub(crate) action: String,
    /// Tone for rewrite or language code for translate
    #[arg(long)]
    pub(crate) payload: Option<String>,
    /// Text to embed in the prompt
    pub(crate) text: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Prompt(args) => {
            println!("{}", render_prompt(&args));
            Ok(())
        }
    }
}

fn render_prompt(args: &PromptArgs) -> String {
    let action = Action::parse(&args.action, args.payload.as_deref());
    build_prompt(action, &args.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["cliro-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from(["cliro-api", "serve", "--port", "9000", "--in-memory"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.in_memory);
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn prompt_command_renders_translation() {
        let cli = Cli::try_parse_from([
            "cliro-api",
            "prompt",
            "--action",
            "traducir",
            "--payload",
            "en",
            "El gato está sobre la mesa",
        ])
        .expect("parses");
        let Some(Command::Prompt(args)) = cli.command else {
            panic!("expected prompt command");
        };
        let prompt = render_prompt(&args);
        assert!(prompt.contains("TRADUCCIÓN (INGLÉS):"));
        assert!(prompt.contains("El gato está sobre la mesa"));
    }
}
