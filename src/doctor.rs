use std::io::{IsTerminal, Write};
use std::net::ToSocketAddrs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    #[must_use]
    fn marker(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

#[derive(Clone, Debug)]
struct CheckItem {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckItem {
    #[must_use]
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    #[must_use]
    fn warn(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warn,
            detail: detail.into(),
        }
    }

    #[must_use]
    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }
}

#[must_use]
pub fn run() -> i32 {
    let checks = vec![
        check_tty(),
        check_required_env(),
        check_log_dir(),
        check_env_file_permission(),
        check_dns_resolution(),
    ];

    println!("stocksim environment report");
    println!("============================================================");
    for item in &checks {
        println!(
            "[{}] {:<20} {}",
            item.status.marker(),
            item.name,
            item.detail
        );
    }
    println!("============================================================");

    let has_fail = checks.iter().any(|item| item.status == CheckStatus::Fail);
    let has_warn = checks.iter().any(|item| item.status == CheckStatus::Warn);

    if has_fail {
        println!("Result: blocking problems found, fix the FAIL items before starting stocksim.");
        return 2;
    }

    if has_warn {
        println!("Result: usable, but the WARN items are worth a look.");
    } else {
        println!("Result: all checks passed.");
    }
    0
}

fn check_tty() -> CheckItem {
    if std::io::stdout().is_terminal() {
        CheckItem::pass("Interactive terminal", "stdout is a TTY.")
    } else {
        CheckItem::warn(
            "Interactive terminal",
            "stdout is not a TTY; the dashboard will refuse to start here.",
        )
    }
}

fn check_required_env() -> CheckItem {
    let missing = crate::config::missing_required_env();
    if !missing.is_empty() {
        return CheckItem::fail("Required settings", format!("missing: {}", missing.join(", ")));
    }

    match crate::config::Config::from_env(None) {
        Ok(config) => {
            let auth = if config.token.is_some() {
                "token set"
            } else {
                "no token, account actions disabled"
            };
            CheckItem::pass(
                "Required settings",
                format!("backend {} ({auth}).", config.api_url),
            )
        }
        Err(err) => CheckItem::fail("Required settings", err.to_string()),
    }
}

fn check_log_dir() -> CheckItem {
    let primary = crate::logger::default_log_dir();
    if let Err(err) = ensure_writable_dir(&primary) {
        let fallback = crate::logger::fallback_log_dir();
        if let Err(fallback_err) = ensure_writable_dir(&fallback) {
            return CheckItem::fail(
                "Log directory",
                format!("default not writable ({err}); temp dir not writable ({fallback_err})."),
            );
        }

        return CheckItem::warn(
            "Log directory",
            format!(
                "default not writable ({}), logs go to {} instead.",
                err,
                fallback.display()
            ),
        );
    }

    CheckItem::pass("Log directory", format!("writable: {}.", primary.display()))
}

#[cfg(unix)]
fn check_env_file_permission() -> CheckItem {
    use std::os::unix::fs::PermissionsExt;

    let env_path = Path::new(".env");
    if !env_path.exists() {
        return CheckItem::pass(".env permissions", "no .env file, settings come from the environment.");
    }

    let metadata = match std::fs::metadata(env_path) {
        Ok(metadata) => metadata,
        Err(err) => {
            return CheckItem::warn(".env permissions", format!("cannot read .env metadata: {err}"));
        }
    };

    let mode = metadata.permissions().mode() & 0o777;
    if env_mode_is_secure(mode) {
        CheckItem::pass(".env permissions", format!(".env mode {mode:o}."))
    } else {
        CheckItem::warn(
            ".env permissions",
            format!(".env mode {mode:o} exposes the token to other users, run: chmod 600 .env"),
        )
    }
}

#[cfg(not(unix))]
fn check_env_file_permission() -> CheckItem {
    CheckItem::pass(".env permissions", "not checked on this platform.")
}

#[cfg(unix)]
fn env_mode_is_secure(mode: u32) -> bool {
    const GROUP_OR_OTHER_PERMISSION_BITS: u32 = 0o077;
    (mode & GROUP_OR_OTHER_PERMISSION_BITS) == 0
}

fn check_dns_resolution() -> CheckItem {
    let Some(target) = std::env::var(crate::config::API_URL)
        .ok()
        .and_then(|raw| endpoint_to_host_port(&raw))
    else {
        return CheckItem::warn("Backend DNS", "no backend address to resolve.");
    };

    match target.to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => CheckItem::pass("Backend DNS", format!("{target} -> {}.", addr.ip())),
            None => CheckItem::warn("Backend DNS", format!("{target} has no address.")),
        },
        Err(err) => CheckItem::warn("Backend DNS", format!("{target}: {err}")),
    }
}

fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)?;
    let probe_path = path.join(format!("doctor_write_probe_{}.tmp", std::process::id()));
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path)?;
    file.write_all(b"probe")?;
    file.flush()?;
    std::fs::remove_file(probe_path)?;
    Ok(())
}

/// `host:port` of a backend URL, with the scheme's default port filled in
fn endpoint_to_host_port(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}
