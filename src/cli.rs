#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Args {
    /// Backend base URL, overrides `STOCKSIM_API_URL`
    pub api_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Args),
    Doctor,
    Help,
    Version,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: i32,
    pub message: String,
}

impl ParseError {
    fn usage(message: String) -> Self {
        Self {
            code: 2,
            message: format!("{message}\n\n{}", help_text("stocksim")),
        }
    }
}

#[must_use]
pub fn help_text(bin_name: &str) -> String {
    format!(
        "Stock Sim Terminal\n\nUsage:\n  {bin_name} [options]\n  {bin_name} doctor\n\nOptions:\n  -h, --help           Show this help\n  -V, --version        Show version\n      --api-url <URL>  Backend base URL (overrides STOCKSIM_API_URL)\n\nCommands:\n  doctor               Check the local environment and exit\n"
    )
}

#[must_use]
pub fn version_text() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

pub fn parse_args<I, S>(args: I) -> Result<Command, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = Args::default();
    let mut show_help = false;
    let mut show_version = false;
    let mut doctor = false;

    let mut args = args.into_iter().map(Into::<String>::into);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--api-url=") {
            if value.is_empty() {
                return Err(ParseError::usage("--api-url requires a value".to_string()));
            }
            parsed.api_url = Some(value.to_string());
            continue;
        }
        match arg.as_str() {
            "-h" | "--help" => show_help = true,
            "-V" | "--version" => show_version = true,
            "--api-url" => match args.next() {
                Some(value) if !value.starts_with('-') => parsed.api_url = Some(value),
                _ => return Err(ParseError::usage("--api-url requires a value".to_string())),
            },
            "doctor" if !doctor => doctor = true,
            _ if arg.starts_with('-') => {
                return Err(ParseError::usage(format!("unknown option: {arg}")));
            }
            _ => {
                return Err(ParseError::usage(format!("unexpected argument: {arg}")));
            }
        }
    }

    if show_help {
        return Ok(Command::Help);
    }

    if show_version {
        return Ok(Command::Version);
    }

    if doctor {
        return Ok(Command::Doctor);
    }

    Ok(Command::Run(parsed))
}
