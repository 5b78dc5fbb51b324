use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub dry_run: bool,
    pub json: bool,
    pub help: bool,
}

/// Parse command-line flags (program name already stripped).
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    for arg in args {
        match arg.as_str() {
            "--dry-run" | "-n" => parsed.dry_run = true,
            "--json" => parsed.json = true,
            "-h" | "--help" => parsed.help = true,
            other => bail!("Unknown argument: {other}\n\nRun `notion-sync --help` for usage."),
        }
    }
    Ok(parsed)
}

pub fn print_help() {
    println!("notion-sync: mirror matching Jira tickets into a Notion database\n");
    println!("USAGE:");
    println!("  notion-sync [--dry-run] [--json]");
    println!();
    println!("OPTIONS:");
    println!("  -n, --dry-run  Look up every ticket but do not create or update records");
    println!("      --json     Print a JSON summary of the run on stdout");
    println!("  -h, --help     Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("  JIRA_URL, JIRA_EMAIL, JIRA_API_TOKEN, NOTION_TOKEN, NOTION_DATABASE_ID");
    println!("  NOTION_SYNC_CONFIG  Optional TOML file (default ~/.notion-sync/config.toml)");
    println!("  RUST_LOG            Log filter (default info)");
    println!();
    println!("EXIT STATUS:");
    println!("  0 all tickets synced, 1 some tickets failed, 2 fetch or configuration error");
}
